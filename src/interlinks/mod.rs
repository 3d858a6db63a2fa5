//! Cross-project interlink support.
//!
//! Fetches remote object inventories and materializes them as local
//! JSON caches mapping symbol names to resolvable URLs.

mod inventory;
mod sync;

pub use inventory::{Inventory, InventoryItem};
pub use sync::{HttpFetcher, InventoryFetcher, SyncReport, Synchronizer};
