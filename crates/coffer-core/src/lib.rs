//! coffer-core
//!
//! Core runtime for coffer: a persistent item-collection table over an
//! ordered key-value store. Items live in collections keyed by a fixed
//! 24-byte composite key, with an exact-match reverse token index kept
//! consistent by a diff-based replacement reconciler.

#![warn(unreachable_pub)]

pub mod error;
pub mod index;
pub mod item;
pub mod key;
pub mod obs;
pub mod serialize;
pub mod store;
pub mod table;

///
/// PRELUDE
///

pub mod prelude {
    pub use crate::{
        error::{ErrorClass, ErrorOrigin, InternalError},
        index::{IndexReference, ReverseIndex, TokenIndexTable},
        item::{CollectionId, Item, ItemIndex},
        key::RawItemKey,
        store::{MemoryStore, ScanEnd, TableId, ValueStore},
        table::ItemTable,
    };
}
