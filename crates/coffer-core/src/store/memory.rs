use crate::store::{ScanEnd, TableId, ValueStore};
use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Included},
};

///
/// MemoryStore
///
/// Ordered in-memory store backed by B-tree maps, one per table. Reference
/// engine for tests and embedding; byte-wise key order matches what a
/// persistent engine would provide.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<TableId, BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored in one table.
    #[must_use]
    pub fn len(&self, table: TableId) -> usize {
        self.tables.get(&table).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, table: TableId) -> bool {
        self.len(table) == 0
    }
}

impl ValueStore for MemoryStore {
    fn get(&self, table: TableId, key: &[u8]) -> Option<Vec<u8>> {
        self.tables.get(&table).and_then(|map| map.get(key).cloned())
    }

    fn set(&mut self, table: TableId, key: &[u8], value: &[u8]) {
        self.tables
            .entry(table)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
    }

    fn remove(&mut self, table: TableId, key: &[u8]) {
        if let Some(map) = self.tables.get_mut(&table) {
            map.remove(key);
        }
    }

    fn range(
        &self,
        table: TableId,
        start: &[u8],
        end: &ScanEnd,
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool,
        limit: usize,
    ) {
        let Some(map) = self.tables.get(&table) else {
            return;
        };

        let mut visited = 0usize;
        let mut visit = |key: &Vec<u8>, value: &Vec<u8>| -> bool {
            if limit != 0 && visited == limit {
                return false;
            }
            visited += 1;
            visitor(key, value)
        };

        match end {
            ScanEnd::Open => {
                for (key, value) in map.range::<[u8], _>((Included(start), std::ops::Bound::Unbounded)) {
                    if !visit(key, value) {
                        return;
                    }
                }
            }
            ScanEnd::Excluded(end) if start <= end.as_slice() => {
                for (key, value) in map.range::<[u8], _>((Included(start), Excluded(end.as_slice()))) {
                    if !visit(key, value) {
                        return;
                    }
                }
            }
            ScanEnd::Excluded(end) => {
                // start > end: descending over (end, start]
                for (key, value) in map
                    .range::<[u8], _>((Excluded(end.as_slice()), Included(start)))
                    .rev()
                {
                    if !visit(key, value) {
                        return;
                    }
                }
            }
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: TableId = TableId(7);

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        for byte in [1u8, 3, 5, 7, 9] {
            store.set(TABLE, &[byte], &[byte]);
        }
        store
    }

    fn collect(
        store: &MemoryStore,
        start: &[u8],
        end: &ScanEnd,
        limit: usize,
    ) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        store.range(
            TABLE,
            start,
            end,
            &mut |key, _| {
                keys.push(key.to_vec());
                true
            },
            limit,
        );
        keys
    }

    #[test]
    fn get_set_remove_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(TABLE, b"k"), None);

        store.set(TABLE, b"k", b"v1");
        assert_eq!(store.get(TABLE, b"k"), Some(b"v1".to_vec()));

        store.set(TABLE, b"k", b"v2");
        assert_eq!(store.get(TABLE, b"k"), Some(b"v2".to_vec()));

        store.remove(TABLE, b"k");
        assert_eq!(store.get(TABLE, b"k"), None);

        // Removing a missing key is a no-op.
        store.remove(TABLE, b"k");
        assert!(store.is_empty(TABLE));
    }

    #[test]
    fn ascending_scan_is_start_inclusive_end_exclusive() {
        let store = seeded();
        let keys = collect(&store, &[3], &ScanEnd::Excluded(vec![7]), 0);
        assert_eq!(keys, vec![vec![3], vec![5]]);
    }

    #[test]
    fn descending_scan_is_start_inclusive_end_exclusive() {
        let store = seeded();
        let keys = collect(&store, &[7], &ScanEnd::Excluded(vec![3]), 0);
        assert_eq!(keys, vec![vec![7], vec![5]]);
    }

    #[test]
    fn open_end_scans_to_table_end() {
        let store = seeded();
        let keys = collect(&store, &[5], &ScanEnd::Open, 0);
        assert_eq!(keys, vec![vec![5], vec![7], vec![9]]);
    }

    #[test]
    fn limit_caps_visits_in_both_directions() {
        let store = seeded();
        assert_eq!(
            collect(&store, &[1], &ScanEnd::Excluded(vec![10]), 2),
            vec![vec![1], vec![3]]
        );
        assert_eq!(
            collect(&store, &[9], &ScanEnd::Excluded(vec![0]), 2),
            vec![vec![9], vec![7]]
        );
    }

    #[test]
    fn equal_bounds_visit_nothing() {
        let store = seeded();
        assert!(collect(&store, &[5], &ScanEnd::Excluded(vec![5]), 0).is_empty());
    }

    #[test]
    fn visitor_stop_halts_the_scan() {
        let store = seeded();
        let mut seen = 0;
        store.range(
            TABLE,
            &[1],
            &ScanEnd::Open,
            &mut |_, _| {
                seen += 1;
                seen < 2
            },
            0,
        );
        assert_eq!(seen, 2);
    }

    #[test]
    fn unknown_table_scans_nothing() {
        let store = seeded();
        let mut visited = false;
        store.range(
            TableId(999),
            &[],
            &ScanEnd::Open,
            &mut |_, _| {
                visited = true;
                true
            },
            0,
        );
        assert!(!visited);
    }
}
