//! Test doubles and common utilities for reconciler contract tests
//!
//! [`CountingStore`] wraps a [`MemoryRecordStore`], records every call in
//! order, and can be told to fail specific operations.

#![allow(dead_code)]

use nbs_core::address;
use nbs_core::error::{Error, Result};
use nbs_core::store::MemoryRecordStore;
use nbs_core::traits::{Host, Lookup, RecordStore, RemoteRecord};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Find,
    Create,
    Update,
    Delete,
}

/// A record store that logs calls and injects failures
///
/// Clones share the call log, the failure plan and the records.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: MemoryRecordStore,
    calls: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<HashSet<(Op, String)>>>,
    fail_filter: Arc<AtomicBool>,
    unreachable: Arc<AtomicBool>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped memory store, for seeding and inspection
    pub fn records(&self) -> &MemoryRecordStore {
        &self.inner
    }

    /// Every call so far, e.g. `"find 10.0.0.1"`, `"delete 10.0.0.9/32"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose verb is `create`, `update` or `delete`
    pub fn mutation_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("create ") || c.starts_with("update ") || c.starts_with("delete ")
            })
            .collect()
    }

    /// Number of calls starting with `verb`
    pub fn count(&self, verb: &str) -> usize {
        let prefix = format!("{} ", verb);
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&prefix) || c.as_str() == verb)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make `op` fail for the given address
    pub fn fail(&self, op: Op, address: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((op, address::normalize(address).to_string()));
    }

    /// Make `filter_by_tag` fail
    pub fn fail_filter(&self) {
        self.fail_filter.store(true, Ordering::SeqCst);
    }

    /// Make `ping` fail
    pub fn set_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: Op, address: &str) -> Result<()> {
        let key = (op, address::normalize(address).to_string());
        if self.failures.lock().unwrap().contains(&key) {
            return Err(Error::provider("counting", format!("{:?} failed for {}", op, address)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for CountingStore {
    async fn ping(&self) -> Result<()> {
        self.log("ping".to_string());
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::http("connection refused"));
        }
        Ok(())
    }

    async fn find_by_address(&self, address: &str) -> Result<Lookup> {
        self.log(format!("find {}", address));
        self.check(Op::Find, address)?;
        self.inner.find_by_address(address).await
    }

    async fn filter_by_tag(&self, tag: &str) -> Result<Vec<RemoteRecord>> {
        self.log(format!("filter {}", tag));
        if self.fail_filter.load(Ordering::SeqCst) {
            return Err(Error::http("timeout"));
        }
        self.inner.filter_by_tag(tag).await
    }

    async fn create(&self, address: &str, tags: &[String], description: &str) -> Result<RemoteRecord> {
        self.log(format!("create {}", address));
        self.check(Op::Create, address)?;
        self.inner.create(address, tags, description).await
    }

    async fn update_description(&self, record: &RemoteRecord, description: &str) -> Result<()> {
        self.log(format!("update {}", record.address));
        self.check(Op::Update, &record.address)?;
        self.inner.update_description(record, description).await
    }

    async fn delete(&self, record: &RemoteRecord) -> Result<()> {
        self.log(format!("delete {}", record.address));
        self.check(Op::Delete, &record.address)?;
        self.inner.delete(record).await
    }

    fn store_name(&self) -> &'static str {
        "counting"
    }
}

/// Scope tag used throughout the contract tests
pub const TAG: &str = "nbs";

/// Hosts `10.0.0.1 ..= 10.0.0.n` described as `host-<i>`
pub fn numbered_hosts(n: u8) -> Vec<Host> {
    (1..=n)
        .map(|i| Host::new(format!("10.0.0.{}", i), format!("host-{}", i)))
        .collect()
}

/// The two-host list used by the worked examples
pub fn gateway_and_dns() -> Vec<Host> {
    vec![Host::new("10.0.0.1", "Gateway"), Host::new("10.0.0.2", "DNS")]
}
