// # Record Store Trait
//
// Defines the interface to the remote IPAM service holding address records.
//
// ## Implementations
//
// - NetBox: `nbs-store-netbox` crate
// - In-memory: `nbs_core::store::MemoryRecordStore` (tests, offline runs)
//
// ## Usage
//
// ```rust,ignore
// use nbs_core::traits::{Lookup, RecordStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     match store.find_by_address("10.0.0.1").await? {
//         Lookup::Found(record) => println!("{}", record.description),
//         Lookup::NotFound => println!("missing"),
//         Lookup::Ambiguous(count) => println!("{} duplicates", count),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An IP address record held by the remote store
///
/// Records are owned by the store. The reconciler reads them within a
/// single operation and never caches them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Store-assigned identity
    pub id: u64,
    /// Address as the store keeps it, possibly with a `/prefix` suffix
    pub address: String,
    /// Free-text description
    pub description: String,
    /// Tags attached to the record
    pub tags: BTreeSet<String>,
}

impl RemoteRecord {
    /// Whether the record carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The record's address without any prefix suffix
    pub fn host_address(&self) -> &str {
        crate::address::normalize(&self.address)
    }
}

/// Result of looking up a record by address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Exactly one record matches
    Found(RemoteRecord),
    /// No record matches
    NotFound,
    /// More than one record matches; carries the match count
    Ambiguous(usize),
}

/// Trait for remote record store implementations
///
/// # Contract
///
/// - One API round-trip per call where the backend allows it
/// - No retries or backoff: failures are returned and the reconciler
///   decides what they mean for the current sync
/// - No caching across calls
/// - Must be safe to reuse across sequential calls
///
/// "Not found" is a [`Lookup::NotFound`] value, never an error. Duplicate
/// addresses are [`Lookup::Ambiguous`], never an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check that the store is reachable and the credentials work
    ///
    /// Called once before each sync. The default implementation does nothing.
    async fn ping(&self) -> Result<(), crate::Error> {
        Ok(())
    }

    /// Look up the record for an exact host address
    ///
    /// # Parameters
    ///
    /// - `address`: bare host address (e.g. "10.0.0.1")
    async fn find_by_address(&self, address: &str) -> Result<Lookup, crate::Error>;

    /// List every record carrying the tag
    async fn filter_by_tag(&self, tag: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Create a record
    ///
    /// # Returns
    ///
    /// The created record as the store now holds it
    async fn create(
        &self,
        address: &str,
        tags: &[String],
        description: &str,
    ) -> Result<RemoteRecord, crate::Error>;

    /// Replace the description of an existing record in place
    ///
    /// Address and tags must be left as they are.
    async fn update_description(
        &self,
        record: &RemoteRecord,
        description: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete(&self, record: &RemoteRecord) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
