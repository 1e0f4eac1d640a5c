use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

///
/// CollectionId
///
/// Identifies a collection. Field order matters: the derived ordering
/// (namespace, then id) must match the byte-wise ordering of the encoded
/// primary key.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("{namespace}/{id}")]
pub struct CollectionId {
    pub namespace: i32,
    pub id: i64,
}

impl CollectionId {
    #[must_use]
    pub const fn new(namespace: i32, id: i64) -> Self {
        Self { namespace, id }
    }
}

///
/// ItemIndex
///
/// Sort position (`index`) plus unique identity (`id`) of an item within
/// its collection. The `id` field is a tiebreak ensuring uniqueness when
/// two items share a sort position.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("{index}:{id}")]
pub struct ItemIndex {
    pub index: i32,
    pub id: i64,
}

impl ItemIndex {
    #[must_use]
    pub const fn new(index: i32, id: i64) -> Self {
        Self { index, id }
    }
}

///
/// Item
///
/// Immutable value record: an opaque payload, its index within the owning
/// collection, and the raw byte tokens discoverable via exact-match reverse
/// lookup. Updates are expressed as whole-item replacement.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Item {
    pub index: ItemIndex,
    pub payload: ByteBuf,
    pub index_keys: Vec<ByteBuf>,
}

impl Item {
    #[must_use]
    pub fn new(
        index: ItemIndex,
        payload: impl Into<Vec<u8>>,
        index_keys: impl IntoIterator<Item = impl Into<Vec<u8>>>,
    ) -> Self {
        Self {
            index,
            payload: ByteBuf::from(payload.into()),
            index_keys: index_keys
                .into_iter()
                .map(|token| ByteBuf::from(token.into()))
                .collect(),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize;

    #[test]
    fn collection_ordering_is_namespace_then_id() {
        let mut ids = vec![
            CollectionId::new(2, 0),
            CollectionId::new(1, 9),
            CollectionId::new(1, 3),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                CollectionId::new(1, 3),
                CollectionId::new(1, 9),
                CollectionId::new(2, 0),
            ]
        );
    }

    #[test]
    fn item_index_ordering_is_index_then_id() {
        let mut indices = vec![
            ItemIndex::new(2, 1),
            ItemIndex::new(1, 7),
            ItemIndex::new(1, 2),
        ];
        indices.sort();
        assert_eq!(
            indices,
            vec![ItemIndex::new(1, 2), ItemIndex::new(1, 7), ItemIndex::new(2, 1)]
        );
    }

    #[test]
    fn item_serializes_round_trip() {
        let item = Item::new(ItemIndex::new(4, 44), b"payload".to_vec(), [b"tok".to_vec()]);
        let bytes = serialize::serialize(&item).expect("serialize item");
        let decoded: Item = serialize::deserialize(&bytes).expect("deserialize item");
        assert_eq!(decoded, item);
    }
}
