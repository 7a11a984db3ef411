//! Plugin-based record store registry
//!
//! The registry lets record stores be registered at runtime, so the binary
//! picks a store by configuration type name instead of hardcoding it.
//!
//! ## Registration
//!
//! Store crates expose a `register` function:
//!
//! ```rust,ignore
//! // In nbs-store-netbox
//! pub fn register(registry: &StoreRegistry) {
//!     registry.register_store("netbox", Box::new(NetboxFactory));
//! }
//! ```

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::MemoryStoreFactory;
use crate::traits::{RecordStore, RecordStoreFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of record store factories keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Box<dyn RecordStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the stores bundled in this crate (`memory`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryStoreFactory));
        registry
    }

    /// Register a record store factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use nbs_core::registry::StoreRegistry;
    /// # use nbs_core::traits::{RecordStore, RecordStoreFactory};
    /// # struct MyFactory;
    /// # impl RecordStoreFactory for MyFactory {
    /// #     fn create(&self, config: &nbs_core::config::StoreConfig) -> nbs_core::Result<Box<dyn RecordStore>> { unimplemented!() }
    /// # }
    /// let registry = StoreRegistry::new();
    /// registry.register_store("mystore", Box::new(MyFactory));
    /// ```
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), factory);
    }

    /// Create a record store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        let store_type = config.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config)
    }

    /// List all registered store types, sorted
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
