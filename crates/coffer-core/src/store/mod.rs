mod memory;

pub use memory::MemoryStore;

use derive_more::Display;

///
/// TableId
///
/// Identifies one logical table inside the ordered store.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TableId(pub i32);

///
/// ScanEnd
///
/// Exclusive end bound of a range scan. `Open` means "scan to table end"
/// and exists because the successor of an all-ones key prefix cannot be
/// represented in-band.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScanEnd {
    Excluded(Vec<u8>),
    Open,
}

///
/// ValueStore
///
/// The ordered key-value collaborator this crate is layered over. The
/// implementation is expected to serialize all operations issued within one
/// transactional context; this crate performs no synchronization of its own.
///

pub trait ValueStore {
    /// Point lookup. Absence is a normal outcome.
    fn get(&self, table: TableId, key: &[u8]) -> Option<Vec<u8>>;

    /// Insert or overwrite one entry.
    fn set(&mut self, table: TableId, key: &[u8], value: &[u8]);

    /// Remove one entry; removing a missing key is a no-op.
    fn remove(&mut self, table: TableId, key: &[u8]);

    /// Visit entries between `start` and `end`, direction implied by the
    /// bounds: ascending over `start <= k < end` when `start` sorts below
    /// `end` (or `end` is [`ScanEnd::Open`]), descending over
    /// `end < k <= start` otherwise. Stops after `limit` visits (`0` =
    /// unlimited) or when the visitor returns `false`.
    fn range(
        &self,
        table: TableId,
        start: &[u8],
        end: &ScanEnd,
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool,
        limit: usize,
    );
}
