//! Host-list reconciler
//!
//! The Reconciler is responsible for:
//! - Upserting every desired host into the record store
//! - Leaving records it does not own (untagged) alone
//! - Garbage-collecting tagged records that left the desired list
//! - Counting one outcome per decision
//!
//! ## Sync Flow
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────────────┐   ┌──────────┐
//! │  ping    │──▶│ upsert × N   │──▶│ garbage collect?   │──▶│  report  │
//! └──────────┘   └──────────────┘   └────────────────────┘   └──────────┘
//!                       │
//!          lookup ──▶ created | updated | unchanged | errors
//! ```
//!
//! Every remote call is awaited before the next one is issued. No retries:
//! a failed host is counted under `errors` and the pass moves on.

mod stats;

pub use stats::{Outcome, SyncReport, SyncStats};

use chrono::Utc;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::address;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{Host, Lookup, RecordStore};

/// One-directional reconciler from a desired host list into a record store
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] or [`Reconciler::from_config()`]
/// 2. Call [`Reconciler::sync()`] as often as needed; each call starts
///    from zeroed counters
pub struct Reconciler {
    /// Remote record store
    store: Box<dyn RecordStore>,

    /// Desired hosts, in processing order
    hosts: Vec<Host>,

    /// Tag attached to created records and used to scope cleanup
    tag: String,

    /// Delete tagged records missing from `hosts`
    cleanup: bool,

    /// Log mutations instead of applying them
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Record store implementation
    /// - `hosts`: Desired hosts with unique addresses
    /// - `tag`: Scope tag
    /// - `cleanup`: Whether `sync` garbage-collects
    pub fn new(
        store: Box<dyn RecordStore>,
        hosts: Vec<Host>,
        tag: impl Into<String>,
        cleanup: bool,
    ) -> Self {
        Self {
            store,
            hosts,
            tag: tag.into(),
            cleanup,
            dry_run: false,
        }
    }

    /// Create a reconciler from a validated configuration
    pub fn from_config(
        store: Box<dyn RecordStore>,
        hosts: Vec<Host>,
        config: &SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(store, hosts, config.tag.clone(), config.cleanup)
            .with_dry_run(config.dry_run))
    }

    /// Enable or disable dry-run mode
    ///
    /// In dry-run mode lookups still hit the store, but creates, updates and
    /// deletes are only logged. Outcomes are counted as if they had been
    /// applied.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Desired hosts
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Scope tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether garbage collection is enabled
    pub fn cleanup(&self) -> bool {
        self.cleanup
    }

    /// Whether dry-run mode is enabled
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Reconcile a single host
    ///
    /// Performs at most one mutation (create or update) and logs exactly one
    /// line describing the outcome.
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome::Created | Outcome::Updated | Outcome::Unchanged)`
    /// - `Err(Error::DuplicateRecord)`: more than one record has the address
    /// - `Err(Error)`: the store failed; nothing further was attempted
    pub async fn upsert(&self, host: &Host) -> Result<Outcome> {
        let label = address::to_host_cidr(&host.address);

        let lookup = match self.store.find_by_address(&host.address).await {
            Ok(lookup) => lookup,
            Err(e) => {
                error!("failed: {} lookup ({})", label, e);
                return Err(e);
            }
        };

        match lookup {
            Lookup::Ambiguous(count) => {
                error!("duplicated: {} ({} records)", label, count);
                Err(Error::duplicate(host.address.clone(), count))
            }

            Lookup::NotFound => {
                if self.dry_run {
                    info!("[DRY-RUN] created: {} \"{}\"", label, host.description);
                    return Ok(Outcome::Created);
                }

                let tags = [self.tag.clone()];
                match self
                    .store
                    .create(&host.address, &tags, &host.description)
                    .await
                {
                    Ok(record) => {
                        info!(
                            "created: {} \"{}\" (#{})",
                            label, host.description, record.id
                        );
                        Ok(Outcome::Created)
                    }
                    Err(e) => {
                        error!("failed: {} create ({})", label, e);
                        Err(e)
                    }
                }
            }

            Lookup::Found(record) => {
                if !record.has_tag(&self.tag) {
                    info!(
                        "unchanged: {} \"{}\" (not tagged '{}')",
                        label, record.description, self.tag
                    );
                    return Ok(Outcome::Unchanged);
                }

                if record.description == host.description {
                    info!("unchanged: {} \"{}\"", label, host.description);
                    return Ok(Outcome::Unchanged);
                }

                if self.dry_run {
                    info!(
                        "[DRY-RUN] updated: {} \"{}\" -> \"{}\"",
                        label, record.description, host.description
                    );
                    return Ok(Outcome::Updated);
                }

                match self
                    .store
                    .update_description(&record, &host.description)
                    .await
                {
                    Ok(()) => {
                        info!(
                            "updated: {} \"{}\" -> \"{}\"",
                            label, record.description, host.description
                        );
                        Ok(Outcome::Updated)
                    }
                    Err(e) => {
                        error!("failed: {} update ({})", label, e);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Delete tagged records whose address is not in the desired list
    ///
    /// Addresses are compared after stripping any prefix suffix. Returns the
    /// counters for this step only: `deleted` per removed record, `errors`
    /// per failed delete, and one `errors` if the tagged records could not
    /// be listed at all.
    pub async fn garbage_collect(&self) -> SyncStats {
        let mut stats = SyncStats::new();

        let tagged = match self.store.filter_by_tag(&self.tag).await {
            Ok(records) => records,
            Err(e) => {
                error!("failed: listing records tagged '{}' ({})", self.tag, e);
                stats.record(Outcome::Error);
                return stats;
            }
        };

        let desired: HashSet<&str> = self
            .hosts
            .iter()
            .map(|host| address::normalize(&host.address))
            .collect();

        for record in tagged
            .iter()
            .filter(|record| !desired.contains(record.host_address()))
        {
            if self.dry_run {
                info!("[DRY-RUN] deleted: {}", record.address);
                stats.record(Outcome::Deleted);
                continue;
            }

            match self.store.delete(record).await {
                Ok(()) => {
                    info!("deleted: {}", record.address);
                    stats.record(Outcome::Deleted);
                }
                Err(e) => {
                    error!("failed: {} delete ({})", record.address, e);
                    stats.record(Outcome::Error);
                }
            }
        }

        stats
    }

    /// Run a full sync pass
    ///
    /// Upserts every host in order, then garbage-collects if cleanup is
    /// enabled. Per-host failures are counted, never returned.
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: the pass completed (possibly with `errors > 0`)
    /// - `Err(Error)`: the store could not be reached at all
    pub async fn sync(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let mut stats = SyncStats::new();

        if let Err(e) = self.store.ping().await {
            error!("Record store {} unreachable: {}", self.store.store_name(), e);
            return Err(e);
        }

        if self.dry_run {
            warn!("Dry-run mode: no changes will be written to {}", self.store.store_name());
        }

        info!("started: {} hosts", self.hosts.len());

        for host in &self.hosts {
            match self.upsert(host).await {
                Ok(outcome) => stats.record(outcome),
                Err(_) => stats.record(Outcome::Error),
            }
        }

        if self.cleanup {
            stats += self.garbage_collect().await;
        }

        info!("finished: {}", stats);

        Ok(SyncReport {
            stats,
            hosts: self.hosts.len(),
            dry_run: self.dry_run,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    fn hosts() -> Vec<Host> {
        vec![Host::new("10.0.0.1", "Gateway"), Host::new("10.0.0.2", "DNS")]
    }

    #[tokio::test]
    async fn test_upsert_creates_tagged_record() {
        let store = MemoryRecordStore::new();
        let reconciler = Reconciler::new(Box::new(store.clone()), hosts(), "nbs", false);

        let outcome = reconciler.upsert(&Host::new("10.0.0.1", "Gateway")).await.unwrap();
        assert_eq!(outcome, Outcome::Created);

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].address, "10.0.0.1/32");
        assert_eq!(records[0].description, "Gateway");
        assert!(records[0].has_tag("nbs"));
    }

    #[tokio::test]
    async fn test_upsert_updates_only_description() {
        let store = MemoryRecordStore::new();
        let seeded = store.insert("10.0.0.1", "Old", ["nbs", "core"]).await;
        let reconciler = Reconciler::new(Box::new(store.clone()), hosts(), "nbs", false);

        let outcome = reconciler.upsert(&Host::new("10.0.0.1", "Gateway")).await.unwrap();
        assert_eq!(outcome, Outcome::Updated);

        let record = store.get(seeded.id).await.unwrap();
        assert_eq!(record.description, "Gateway");
        assert_eq!(record.address, seeded.address);
        assert_eq!(record.tags, seeded.tags);
    }

    #[tokio::test]
    async fn test_upsert_passes_untagged_record_through() {
        let store = MemoryRecordStore::new();
        let seeded = store.insert("10.0.0.1", "Manual", Vec::<String>::new()).await;
        let reconciler = Reconciler::new(Box::new(store.clone()), hosts(), "nbs", false);

        let outcome = reconciler.upsert(&Host::new("10.0.0.1", "Gateway")).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.get(seeded.id).await.unwrap(), seeded);
    }

    #[tokio::test]
    async fn test_upsert_duplicate_is_error() {
        let store = MemoryRecordStore::new();
        store.insert("10.0.0.1", "a", ["nbs"]).await;
        store.insert("10.0.0.1", "b", ["nbs"]).await;
        let reconciler = Reconciler::new(Box::new(store.clone()), hosts(), "nbs", false);

        let err = reconciler
            .upsert(&Host::new("10.0.0.1", "Gateway"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord { count: 2, .. }));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_changes() {
        let store = MemoryRecordStore::new();
        store.insert("10.0.0.1", "Old", ["nbs"]).await;
        store.insert("10.0.0.9", "Stale", ["nbs"]).await;
        let before = store.records().await;

        let reconciler =
            Reconciler::new(Box::new(store.clone()), hosts(), "nbs", true).with_dry_run(true);
        let report = reconciler.sync().await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.stats.updated, 1);
        assert_eq!(report.stats.created, 1);
        assert_eq!(report.stats.deleted, 1);
        assert_eq!(store.records().await, before);
    }

    #[tokio::test]
    async fn test_sync_report_metadata() {
        let store = MemoryRecordStore::new();
        let reconciler = Reconciler::new(Box::new(store), hosts(), "nbs", false);

        let report = reconciler.sync().await.unwrap();
        assert_eq!(report.hosts, 2);
        assert!(report.finished_at >= report.started_at);
        assert!(report.elapsed() >= chrono::Duration::zero());
    }

    #[test]
    fn test_from_config_validates() {
        use crate::config::{InventoryConfig, StoreConfig};

        let config = SyncConfig::new(StoreConfig::Memory, InventoryConfig::default())
            .with_tag("")
            .with_cleanup(true);
        let result = Reconciler::from_config(Box::new(MemoryRecordStore::new()), hosts(), &config);
        assert!(result.is_err());

        let config = config.with_tag("scanner").with_dry_run(true);
        let reconciler =
            Reconciler::from_config(Box::new(MemoryRecordStore::new()), hosts(), &config).unwrap();
        assert_eq!(reconciler.tag(), "scanner");
        assert!(reconciler.cleanup());
        assert!(reconciler.dry_run());
    }
}
