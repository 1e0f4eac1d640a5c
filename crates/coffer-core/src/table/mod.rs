//! The primary item table: point and range operations over collections of
//! items, plus the replace-collection reconciler that keeps the reverse
//! token index consistent with the stored rows.


use crate::{
    error::InternalError,
    index::{IndexReference, ReverseIndex},
    item::{CollectionId, Item, ItemIndex},
    key::{self, RawItemKey},
    obs::{self, MetricsEvent},
    serialize,
    store::{ScanEnd, TableId, ValueStore},
};
use serde_bytes::ByteBuf;
use std::collections::{BTreeMap, BTreeSet};

/// Maximum accepted size of one serialized item row.
///
/// Enforced on both sides: oversized items are rejected on write before
/// anything is stored, and rows larger than this are treated as corrupt
/// on read.
pub const MAX_ITEM_BYTES: usize = 4 * 1024 * 1024;

///
/// ItemTable
///
/// Persistent table of items grouped into collections, layered over an
/// ordered store and a reverse-index collaborator. Holds no locks and no
/// in-memory cache; single logical writer per transaction is assumed.
///

pub struct ItemTable<S, I> {
    store: S,
    table: TableId,
    index: I,
}

impl<S: ValueStore, I: ReverseIndex> ItemTable<S, I> {
    #[must_use]
    pub const fn new(store: S, table: TableId, index: I) -> Self {
        Self {
            store,
            table,
            index,
        }
    }

    #[must_use]
    pub const fn table(&self) -> TableId {
        self.table
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn index(&self) -> &I {
        &self.index
    }

    /// Items at or before `item_index`, descending, capped at `count`.
    pub fn lower_items(
        &self,
        collection: CollectionId,
        item_index: ItemIndex,
        count: usize,
    ) -> Result<Vec<Item>, InternalError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let start = RawItemKey::new(collection, item_index);
        let end = ScanEnd::Excluded(key::collection_lower_bound(collection));
        self.scan_items(start.as_bytes(), &end, count)
    }

    /// Items at or after `item_index`, ascending, capped at `count`.
    pub fn higher_items(
        &self,
        collection: CollectionId,
        item_index: ItemIndex,
        count: usize,
    ) -> Result<Vec<Item>, InternalError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let start = RawItemKey::new(collection, item_index);
        let end = key::collection_upper_bound(collection);
        self.scan_items(start.as_bytes(), &end, count)
    }

    /// Every item in every collection of `namespace`, grouped by collection,
    /// each group in ascending key order.
    pub fn get_items(
        &self,
        namespace: i32,
    ) -> Result<BTreeMap<CollectionId, Vec<Item>>, InternalError> {
        let start = key::namespace_lower_bound(namespace);
        let end = key::namespace_upper_bound(namespace);

        let mut grouped: BTreeMap<CollectionId, Vec<Item>> = BTreeMap::new();
        let mut rows = 0u64;
        let mut failure: Option<InternalError> = None;

        self.store.range(
            self.table,
            &start,
            &end,
            &mut |raw_key, value| {
                let outcome = RawItemKey::try_from_bytes(raw_key)
                    .map_err(InternalError::from)
                    .and_then(|raw| Ok((raw.collection(), Self::decode_item(value)?)));

                match outcome {
                    Ok((collection, item)) => {
                        rows += 1;
                        grouped.entry(collection).or_default().push(item);
                        true
                    }
                    Err(err) => {
                        failure = Some(err);
                        false
                    }
                }
            },
            0,
        );

        if let Some(err) = failure {
            return Err(err);
        }
        obs::record(MetricsEvent::RowsScanned { rows });

        Ok(grouped)
    }

    /// Replace the full contents of `collection` with `items`.
    ///
    /// The desired set is diffed against the stored set and only the
    /// difference is written: an index present in both is left completely
    /// untouched, with no re-serialization and no reverse-index churn.
    /// Duplicate indices and items whose serialized form exceeds
    /// [`MAX_ITEM_BYTES`] are rejected before anything is written.
    ///
    /// Not internally atomic: if the surrounding transaction aborts midway,
    /// restoring primary/index consistency is the transaction engine's
    /// responsibility.
    pub fn replace_items(
        &mut self,
        collection: CollectionId,
        items: Vec<Item>,
    ) -> Result<(), InternalError> {
        let mut desired: BTreeMap<ItemIndex, Item> = BTreeMap::new();
        for item in items {
            let item_index = item.index;
            if desired.insert(item_index, item).is_some() {
                return Err(InternalError::table_conflict(format!(
                    "duplicate item index in replacement set: collection {collection}, index {item_index}"
                )));
            }
        }

        let (current, removed_index_keys) = self.scan_current(collection, &desired)?;

        // Encode additions before touching either table so an unsupported
        // item leaves the stored state unmodified.
        let mut additions: Vec<(ItemIndex, Vec<u8>)> = Vec::new();
        for (item_index, item) in &desired {
            if current.contains(item_index) {
                continue;
            }

            let bytes = serialize::serialize(item).map_err(InternalError::from)?;
            if bytes.len() > MAX_ITEM_BYTES {
                return Err(InternalError::table_unsupported(format!(
                    "serialized item is {} bytes (limit {MAX_ITEM_BYTES}): collection {collection}, index {item_index}",
                    bytes.len()
                )));
            }
            additions.push((*item_index, bytes));
        }

        let mut index_inserts = 0u64;
        let mut index_removes = 0u64;

        // Removals may all precede insertions; per-index interleaving is not
        // part of the contract.
        for item_index in &current {
            if desired.contains_key(item_index) {
                continue;
            }

            let raw = RawItemKey::new(collection, *item_index);
            self.store.remove(self.table, raw.as_bytes());
            obs::record(MetricsEvent::RowRemove);

            if let Some(tokens) = removed_index_keys.get(item_index) {
                self.index.remove(
                    collection.namespace,
                    IndexReference::new(collection, *item_index),
                    tokens,
                )?;
                index_removes += tokens.len() as u64;
            }
        }

        for (item_index, bytes) in additions {
            let raw = RawItemKey::new(collection, item_index);
            self.store.set(self.table, raw.as_bytes(), &bytes);
            obs::record(MetricsEvent::RowWrite);

            let item = &desired[&item_index];
            if !item.index_keys.is_empty() {
                self.index.add(
                    collection.namespace,
                    IndexReference::new(collection, item_index),
                    &item.index_keys,
                )?;
                index_inserts += item.index_keys.len() as u64;
            }
        }

        if index_inserts != 0 || index_removes != 0 {
            obs::record(MetricsEvent::ReverseIndexDelta {
                inserts: index_inserts,
                removes: index_removes,
            });
        }

        Ok(())
    }

    /// Items discoverable under exactly `token`, resolved through the
    /// reverse index and then point-looked-up here.
    ///
    /// A reference the index returns but this table cannot resolve is a
    /// fatal consistency violation, not an empty result.
    pub fn exact_indexed_items(
        &self,
        namespace: i32,
        token: &[u8],
    ) -> Result<Vec<Item>, InternalError> {
        let references = self.index.exact_references(namespace, token)?;

        let mut result = Vec::with_capacity(references.len());
        for reference in references {
            let raw = RawItemKey::new(reference.collection, reference.index);
            let Some(value) = self.store.get(self.table, raw.as_bytes()) else {
                return Err(InternalError::table_corruption(format!(
                    "reverse index reference has no primary row: collection {}, index {}",
                    reference.collection, reference.index
                )));
            };
            result.push(Self::decode_item(&value)?);
        }

        Ok(result)
    }

    /// Transaction-lifecycle hook; this table keeps no memory cache.
    pub fn clear_memory_cache(&mut self) {}

    /// Transaction-lifecycle hook; this table has nothing to flush.
    pub fn before_commit(&mut self) {}

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn decode_item(bytes: &[u8]) -> Result<Item, InternalError> {
        serialize::deserialize_bounded(bytes, MAX_ITEM_BYTES).map_err(InternalError::from)
    }

    /// Unbounded scan of one collection's stored rows: the full set of
    /// stored indices, plus the remembered tokens of every row that is
    /// about to disappear (needed to clean the reverse index).
    #[expect(clippy::type_complexity)]
    fn scan_current(
        &self,
        collection: CollectionId,
        desired: &BTreeMap<ItemIndex, Item>,
    ) -> Result<(BTreeSet<ItemIndex>, BTreeMap<ItemIndex, Vec<ByteBuf>>), InternalError> {
        let start = key::collection_lower_bound(collection);
        let end = key::collection_upper_bound(collection);

        let mut current: BTreeSet<ItemIndex> = BTreeSet::new();
        let mut removed_index_keys: BTreeMap<ItemIndex, Vec<ByteBuf>> = BTreeMap::new();
        let mut rows = 0u64;
        let mut failure: Option<InternalError> = None;

        self.store.range(
            self.table,
            &start,
            &end,
            &mut |raw_key, value| {
                rows += 1;

                let outcome =
                    RawItemKey::try_from_bytes(raw_key)
                        .map_err(InternalError::from)
                        .and_then(|raw| {
                            let item_index = raw.item_index();
                            current.insert(item_index);

                            if !desired.contains_key(&item_index) {
                                let item = Self::decode_item(value)?;
                                if !item.index_keys.is_empty() {
                                    removed_index_keys.insert(item_index, item.index_keys);
                                }
                            }

                            Ok(())
                        });

                match outcome {
                    Ok(()) => true,
                    Err(err) => {
                        failure = Some(err);
                        false
                    }
                }
            },
            0,
        );

        if let Some(err) = failure {
            return Err(err);
        }
        obs::record(MetricsEvent::RowsScanned { rows });

        Ok((current, removed_index_keys))
    }

    fn scan_items(
        &self,
        start: &[u8],
        end: &ScanEnd,
        limit: usize,
    ) -> Result<Vec<Item>, InternalError> {
        let mut items = Vec::new();
        let mut failure: Option<InternalError> = None;

        self.store.range(
            self.table,
            start,
            end,
            &mut |_, value| match Self::decode_item(value) {
                Ok(item) => {
                    items.push(item);
                    true
                }
                Err(err) => {
                    failure = Some(err);
                    false
                }
            },
            limit,
        );

        if let Some(err) = failure {
            return Err(err);
        }
        obs::record(MetricsEvent::RowsScanned {
            rows: items.len() as u64,
        });

        Ok(items)
    }
}
