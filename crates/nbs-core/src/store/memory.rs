// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Behaves like an IPAM service without one: addresses are stored in host
// CIDR form (`10.0.0.1/32`), records get sequential ids, and lookups go
// through the same prefix normalization the real service needs.
//
// Unlike NetBox, it does not reject duplicate addresses on `insert`, which
// makes it suitable for exercising the reconciler's duplicate handling.
//
// ## When to Use
//
// - Tests
// - Offline runs of the CLI (`--store memory`) to preview a hosts file

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::address;
use crate::config::StoreConfig;
use crate::traits::{Lookup, RecordStore, RecordStoreFactory, RemoteRecord};
use crate::Error;

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    records: BTreeMap<u64, RemoteRecord>,
}

impl Inner {
    fn insert(&mut self, address: &str, description: &str, tags: BTreeSet<String>) -> RemoteRecord {
        self.next_id += 1;
        let record = RemoteRecord {
            id: self.next_id,
            address: address::to_host_cidr(address),
            description: description.to_string(),
            tags,
        };
        self.records.insert(record.id, record.clone());
        record
    }
}

/// In-memory record store implementation
///
/// Clones share the same underlying records, so a test can keep a handle
/// while the reconciler owns a boxed copy.
///
/// # Example
///
/// ```rust,no_run
/// use nbs_core::store::MemoryRecordStore;
/// use nbs_core::traits::{Lookup, RecordStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///     store.create("10.0.0.1", &["nbs".to_string()], "Gateway").await?;
///
///     let found = store.find_by_address("10.0.0.1").await?;
///     assert!(matches!(found, Lookup::Found(_)));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing duplicate checks
    pub async fn insert<I, T>(&self, address: &str, description: &str, tags: I) -> RemoteRecord
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tags = tags.into_iter().map(Into::into).collect();
        self.inner.write().await.insert(address, description, tags)
    }

    /// Snapshot of every record, ordered by id
    pub async fn records(&self) -> Vec<RemoteRecord> {
        self.inner.read().await.records.values().cloned().collect()
    }

    /// Get a record by id
    pub async fn get(&self, id: u64) -> Option<RemoteRecord> {
        self.inner.read().await.records.get(&id).cloned()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// Remove every record
    pub async fn clear(&self) {
        self.inner.write().await.records.clear();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_address(&self, address: &str) -> Result<Lookup, Error> {
        let wanted = address::normalize(address);
        let guard = self.inner.read().await;
        let mut matches = guard
            .records
            .values()
            .filter(|record| record.host_address() == wanted);

        Ok(match (matches.next(), matches.count()) {
            (None, _) => Lookup::NotFound,
            (Some(record), 0) => Lookup::Found(record.clone()),
            (Some(_), rest) => Lookup::Ambiguous(rest + 1),
        })
    }

    async fn filter_by_tag(&self, tag: &str) -> Result<Vec<RemoteRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .records
            .values()
            .filter(|record| record.has_tag(tag))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        address: &str,
        tags: &[String],
        description: &str,
    ) -> Result<RemoteRecord, Error> {
        let mut guard = self.inner.write().await;
        let wanted = address::normalize(address);
        if guard.records.values().any(|r| r.host_address() == wanted) {
            return Err(Error::store(format!("Address already exists: {}", address)));
        }
        Ok(guard.insert(address, description, tags.iter().cloned().collect()))
    }

    async fn update_description(
        &self,
        record: &RemoteRecord,
        description: &str,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let stored = guard
            .records
            .get_mut(&record.id)
            .ok_or_else(|| Error::not_found(format!("record #{}", record.id)))?;
        stored.description = description.to_string();
        Ok(())
    }

    async fn delete(&self, record: &RemoteRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .records
            .remove(&record.id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("record #{}", record.id)))
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory stores
pub struct MemoryStoreFactory;

impl RecordStoreFactory for MemoryStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
