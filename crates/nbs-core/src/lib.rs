// # nbs-core
//
// Core library for reconciling a host inventory into an IPAM service.
//
// ## Architecture Overview
//
// - **RecordStore**: Trait for querying and mutating remote address records
// - **HostSource**: Trait for loading the desired host list
// - **Reconciler**: One-directional upsert + tag-scoped garbage collection
// - **StoreRegistry**: Plugin-based registry for record stores
//
// ## Design Principles
//
// 1. **Local list is authoritative**: the store is made to match it, never the reverse
// 2. **Tag-scoped ownership**: only records carrying the scope tag are updated or deleted
// 3. **Plugin-Based**: Stores are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A second sync over unchanged state changes nothing

pub mod address;
pub mod config;
pub mod error;
pub mod inventory;
pub mod reconciler;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{InventoryConfig, StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use inventory::{FileHostSource, StaticHostSource};
pub use reconciler::{Outcome, Reconciler, SyncReport, SyncStats};
pub use registry::StoreRegistry;
pub use store::MemoryRecordStore;
pub use traits::{Host, HostSource, Lookup, RecordStore, RemoteRecord};
