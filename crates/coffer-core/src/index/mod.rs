mod reference;

pub use reference::{
    IndexReference, ReferenceDecodeError, decode_references, encode_references,
};

use crate::{
    error::InternalError,
    store::{TableId, ValueStore},
};
use serde_bytes::ByteBuf;

///
/// ReverseIndex
///
/// Secondary-index collaborator: exact-match token-to-reference
/// bookkeeping. Token bytes are opaque; the index never interprets them.
///

pub trait ReverseIndex {
    /// Record `reference` as discoverable under each of `tokens`.
    fn add(
        &mut self,
        namespace: i32,
        reference: IndexReference,
        tokens: &[ByteBuf],
    ) -> Result<(), InternalError>;

    /// Drop `reference` from each of `tokens`. Unknown tokens are a no-op.
    fn remove(
        &mut self,
        namespace: i32,
        reference: IndexReference,
        tokens: &[ByteBuf],
    ) -> Result<(), InternalError>;

    /// All references recorded under exactly `token`, in reference order.
    fn exact_references(
        &self,
        namespace: i32,
        token: &[u8],
    ) -> Result<Vec<IndexReference>, InternalError>;
}

///
/// TokenIndexTable
///
/// Reverse-index implementation over an ordered store. One row per
/// `(namespace, token)` pair: key is `namespace(4) ‖ token`, value is the
/// reference array blob, kept sorted and deduplicated. The row is removed
/// when its last reference is dropped, so stale tokens never linger.
///

pub struct TokenIndexTable<S> {
    store: S,
    table: TableId,
}

impl<S: ValueStore> TokenIndexTable<S> {
    #[must_use]
    pub const fn new(store: S, table: TableId) -> Self {
        Self { store, table }
    }

    #[must_use]
    pub const fn table(&self) -> TableId {
        self.table
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn token_key(namespace: i32, token: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(4 + token.len());
        key.extend_from_slice(&namespace.to_be_bytes());
        key.extend_from_slice(token);
        key
    }

    fn load(&self, key: &[u8]) -> Result<Vec<IndexReference>, InternalError> {
        match self.store.get(self.table, key) {
            Some(blob) => decode_references(&blob).map_err(InternalError::from),
            None => Ok(Vec::new()),
        }
    }
}

impl<S: ValueStore> ReverseIndex for TokenIndexTable<S> {
    fn add(
        &mut self,
        namespace: i32,
        reference: IndexReference,
        tokens: &[ByteBuf],
    ) -> Result<(), InternalError> {
        for token in tokens {
            let key = Self::token_key(namespace, token);
            let mut references = self.load(&key)?;

            if let Err(slot) = references.binary_search(&reference) {
                references.insert(slot, reference);
                self.store.set(self.table, &key, &encode_references(&references));
            }
        }

        Ok(())
    }

    fn remove(
        &mut self,
        namespace: i32,
        reference: IndexReference,
        tokens: &[ByteBuf],
    ) -> Result<(), InternalError> {
        for token in tokens {
            let key = Self::token_key(namespace, token);
            let mut references = self.load(&key)?;

            if let Ok(slot) = references.binary_search(&reference) {
                references.remove(slot);
                if references.is_empty() {
                    self.store.remove(self.table, &key);
                } else {
                    self.store.set(self.table, &key, &encode_references(&references));
                }
            }
        }

        Ok(())
    }

    fn exact_references(
        &self,
        namespace: i32,
        token: &[u8],
    ) -> Result<Vec<IndexReference>, InternalError> {
        self.load(&Self::token_key(namespace, token))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        item::{CollectionId, ItemIndex},
        store::MemoryStore,
    };

    const TABLE: TableId = TableId(2);

    fn reference(collection: i64, index: i32) -> IndexReference {
        IndexReference::new(CollectionId::new(1, collection), ItemIndex::new(index, 0))
    }

    fn tokens(raw: &[&[u8]]) -> Vec<ByteBuf> {
        raw.iter().map(|token| ByteBuf::from(token.to_vec())).collect()
    }

    #[test]
    fn add_then_exact_lookup_returns_reference() {
        let mut index = TokenIndexTable::new(MemoryStore::new(), TABLE);
        index
            .add(1, reference(100, 1), &tokens(&[b"a", b"b"]))
            .unwrap();

        assert_eq!(index.exact_references(1, b"a").unwrap(), vec![reference(100, 1)]);
        assert_eq!(index.exact_references(1, b"b").unwrap(), vec![reference(100, 1)]);
        assert_eq!(index.exact_references(1, b"c").unwrap(), Vec::new());
        // Namespaces are isolated.
        assert_eq!(index.exact_references(2, b"a").unwrap(), Vec::new());
    }

    #[test]
    fn references_stay_sorted_and_deduplicated() {
        let mut index = TokenIndexTable::new(MemoryStore::new(), TABLE);
        index.add(1, reference(200, 2), &tokens(&[b"t"])).unwrap();
        index.add(1, reference(100, 1), &tokens(&[b"t"])).unwrap();
        index.add(1, reference(100, 1), &tokens(&[b"t"])).unwrap();

        assert_eq!(
            index.exact_references(1, b"t").unwrap(),
            vec![reference(100, 1), reference(200, 2)]
        );
    }

    #[test]
    fn removing_last_reference_drops_the_row() {
        let mut index = TokenIndexTable::new(MemoryStore::new(), TABLE);
        index.add(1, reference(100, 1), &tokens(&[b"t"])).unwrap();
        index.add(1, reference(100, 2), &tokens(&[b"t"])).unwrap();

        index.remove(1, reference(100, 1), &tokens(&[b"t"])).unwrap();
        assert_eq!(index.exact_references(1, b"t").unwrap(), vec![reference(100, 2)]);

        index.remove(1, reference(100, 2), &tokens(&[b"t"])).unwrap();
        assert_eq!(index.exact_references(1, b"t").unwrap(), Vec::new());
        assert!(index.store.is_empty(TABLE));
    }

    #[test]
    fn removing_unknown_token_is_a_no_op() {
        let mut index = TokenIndexTable::new(MemoryStore::new(), TABLE);
        index
            .remove(1, reference(100, 1), &tokens(&[b"missing"]))
            .unwrap();
        assert!(index.store.is_empty(TABLE));
    }

    #[test]
    fn corrupt_blob_surfaces_as_index_corruption() {
        let mut store = MemoryStore::new();
        store.set(TABLE, &TokenIndexTable::<MemoryStore>::token_key(1, b"t"), &[0u8; 23]);

        let index = TokenIndexTable::new(store, TABLE);
        let err = index.exact_references(1, b"t").expect_err("must fail");
        assert!(err.is_corruption());
    }
}
