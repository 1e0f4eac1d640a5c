//! Reverse-index reference records and their array blob codec.
//!
//! A reference array serializes as a bare concatenation of fixed 24-byte
//! records, no header or count prefix; the record count is implied by
//! `length / 24`. A blob length that is not a record multiple is a
//! corruption signal, not a recoverable condition.

use crate::{
    error::InternalError,
    item::{CollectionId, ItemIndex},
};
use thiserror::Error as ThisError;

///
/// ReferenceDecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, ThisError)]
pub enum ReferenceDecodeError {
    #[error("reference blob length {len} is not a multiple of {record} bytes")]
    MisalignedBlob { len: usize, record: usize },
}

impl From<ReferenceDecodeError> for InternalError {
    fn from(err: ReferenceDecodeError) -> Self {
        Self::index_corruption(err.to_string())
    }
}

///
/// IndexReference
///
/// Lightweight pointer at an item: collection plus item index, no payload.
/// Same field layout and order as the primary key.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IndexReference {
    pub collection: CollectionId,
    pub index: ItemIndex,
}

impl IndexReference {
    /// Fixed on-disk record size (protocol invariant).
    /// DO NOT CHANGE without migration.
    pub const RECORD_SIZE: usize = 4 + 8 + 4 + 8;

    #[must_use]
    pub const fn new(collection: CollectionId, index: ItemIndex) -> Self {
        Self { collection, index }
    }

    fn write_record(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.collection.namespace.to_be_bytes());
        out.extend_from_slice(&self.collection.id.to_be_bytes());
        out.extend_from_slice(&self.index.index.to_be_bytes());
        out.extend_from_slice(&self.index.id.to_be_bytes());
    }

    fn read_record(record: &[u8]) -> Self {
        let mut ns = [0u8; 4];
        let mut cid = [0u8; 8];
        let mut idx = [0u8; 4];
        let mut id = [0u8; 8];
        ns.copy_from_slice(&record[..4]);
        cid.copy_from_slice(&record[4..12]);
        idx.copy_from_slice(&record[12..16]);
        id.copy_from_slice(&record[16..24]);

        Self {
            collection: CollectionId::new(i32::from_be_bytes(ns), i64::from_be_bytes(cid)),
            index: ItemIndex::new(i32::from_be_bytes(idx), i64::from_be_bytes(id)),
        }
    }
}

/// Encode references as a concatenation of fixed records.
#[must_use]
pub fn encode_references(references: &[IndexReference]) -> Vec<u8> {
    let mut out = Vec::with_capacity(references.len() * IndexReference::RECORD_SIZE);
    for reference in references {
        reference.write_record(&mut out);
    }
    out
}

/// Decode a reference blob; the count is implied by the blob length.
pub fn decode_references(bytes: &[u8]) -> Result<Vec<IndexReference>, ReferenceDecodeError> {
    if bytes.len() % IndexReference::RECORD_SIZE != 0 {
        return Err(ReferenceDecodeError::MisalignedBlob {
            len: bytes.len(),
            record: IndexReference::RECORD_SIZE,
        });
    }

    Ok(bytes
        .chunks_exact(IndexReference::RECORD_SIZE)
        .map(IndexReference::read_record)
        .collect())
}

///
/// TESTS
///
