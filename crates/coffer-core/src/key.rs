//! Fixed-width composite key codec for the primary item table.
//!
//! Layout (24 bytes, big-endian, no padding):
//! `namespace(4) ‖ collection id(8) ‖ index(4) ‖ item id(8)`
//!
//! Fields are emitted most-significant-first in priority order, so byte-wise
//! comparison reproduces the (collection, index, id) ordering for
//! non-negative field values. Signed fields are emitted verbatim for on-disk
//! compatibility; negative identifiers would sort after positive ones.

use crate::{
    error::InternalError,
    item::{CollectionId, ItemIndex},
    store::ScanEnd,
};
use thiserror::Error as ThisError;

///
/// ItemKeyDecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, ThisError)]
pub enum ItemKeyDecodeError {
    #[error("invalid item key length: {len} bytes (expected {expected})")]
    InvalidLength { len: usize, expected: usize },
}

impl From<ItemKeyDecodeError> for InternalError {
    fn from(err: ItemKeyDecodeError) -> Self {
        Self::store_corruption(err.to_string())
    }
}

///
/// RawItemKey
///
/// Fixed on-disk primary key. Built fresh per call; there is no shared
/// scratch buffer, so a key stays valid for as long as it is held.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RawItemKey([u8; Self::SIZE]);

impl RawItemKey {
    /// Fixed on-disk size in bytes (protocol invariant).
    /// DO NOT CHANGE without migration.
    pub const SIZE: usize = 4 + 8 + 4 + 8;

    const COLLECTION_ID_OFFSET: usize = 4;
    const INDEX_OFFSET: usize = 4 + 8;
    const ITEM_ID_OFFSET: usize = 4 + 8 + 4;

    #[must_use]
    pub fn new(collection: CollectionId, index: ItemIndex) -> Self {
        let mut buf = [0u8; Self::SIZE];
        buf[..Self::COLLECTION_ID_OFFSET].copy_from_slice(&collection.namespace.to_be_bytes());
        buf[Self::COLLECTION_ID_OFFSET..Self::INDEX_OFFSET]
            .copy_from_slice(&collection.id.to_be_bytes());
        buf[Self::INDEX_OFFSET..Self::ITEM_ID_OFFSET].copy_from_slice(&index.index.to_be_bytes());
        buf[Self::ITEM_ID_OFFSET..].copy_from_slice(&index.id.to_be_bytes());
        Self(buf)
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, ItemKeyDecodeError> {
        if bytes.len() != Self::SIZE {
            return Err(ItemKeyDecodeError::InvalidLength {
                len: bytes.len(),
                expected: Self::SIZE,
            });
        }

        let mut buf = [0u8; Self::SIZE];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    #[must_use]
    pub fn collection(&self) -> CollectionId {
        CollectionId {
            namespace: read_i32(&self.0[..Self::COLLECTION_ID_OFFSET]),
            id: read_i64(&self.0[Self::COLLECTION_ID_OFFSET..Self::INDEX_OFFSET]),
        }
    }

    #[must_use]
    pub fn item_index(&self) -> ItemIndex {
        ItemIndex {
            index: read_i32(&self.0[Self::INDEX_OFFSET..Self::ITEM_ID_OFFSET]),
            id: read_i64(&self.0[Self::ITEM_ID_OFFSET..]),
        }
    }
}

fn read_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    i32::from_be_bytes(buf)
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}

/// Inclusive lower bound of a namespace scan: the bare 4-byte prefix, which
/// sorts below every full key in that namespace.
#[must_use]
pub fn namespace_lower_bound(namespace: i32) -> Vec<u8> {
    namespace.to_be_bytes().to_vec()
}

/// Exclusive upper bound of a namespace scan: the successor of the 4-byte
/// prefix, the smallest byte string strictly greater than every key that
/// starts with it.
#[must_use]
pub fn namespace_upper_bound(namespace: i32) -> ScanEnd {
    prefix_successor(&namespace.to_be_bytes())
}

/// Inclusive lower bound of a collection scan: the bare 12-byte
/// `namespace ‖ id` prefix.
#[must_use]
pub fn collection_lower_bound(collection: CollectionId) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(12);
    prefix.extend_from_slice(&collection.namespace.to_be_bytes());
    prefix.extend_from_slice(&collection.id.to_be_bytes());
    prefix
}

/// Exclusive upper bound of a collection scan: the successor of the 12-byte
/// prefix.
#[must_use]
pub fn collection_upper_bound(collection: CollectionId) -> ScanEnd {
    prefix_successor(&collection_lower_bound(collection))
}

/// Big-endian successor of a prefix: numeric increment with the carry
/// propagating leftward. An all-ones prefix has no in-band successor and
/// degrades to an open end (scan to table end).
fn prefix_successor(prefix: &[u8]) -> ScanEnd {
    let mut out = prefix.to_vec();
    for byte in out.iter_mut().rev() {
        if *byte == 0xFF {
            *byte = 0x00;
        } else {
            *byte += 1;
            return ScanEnd::Excluded(out);
        }
    }

    ScanEnd::Open
}

///
/// TESTS
///
