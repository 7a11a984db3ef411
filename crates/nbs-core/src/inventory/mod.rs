//! Desired-state inventories
//!
//! - [`FileHostSource`]: hosts file on disk
//! - [`StaticHostSource`]: a list supplied in code or configuration
//!
//! Both validate addresses and reject duplicates before the reconciler
//! ever sees the list.

mod file;

pub use file::{FileHostSource, parse_hosts};

use async_trait::async_trait;
use std::collections::HashSet;

use crate::address;
use crate::config::InventoryConfig;
use crate::error::{Error, Result};
use crate::traits::{Host, HostSource};

/// Host source over a fixed list
#[derive(Debug, Clone, Default)]
pub struct StaticHostSource {
    hosts: Vec<Host>,
}

impl StaticHostSource {
    /// Create a source that returns the given hosts
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Self {
        Self {
            hosts: hosts.into_iter().collect(),
        }
    }
}

#[async_trait]
impl HostSource for StaticHostSource {
    async fn hosts(&self) -> Result<Vec<Host>> {
        check_hosts(self.hosts.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Build the host source described by the configuration
pub fn from_config(config: &InventoryConfig) -> Box<dyn HostSource> {
    match config {
        InventoryConfig::File { path } => Box::new(FileHostSource::new(path)),
        InventoryConfig::Inline { hosts } => Box::new(StaticHostSource::new(hosts.clone())),
    }
}

/// Normalize addresses and reject invalid or repeated ones
pub(crate) fn check_hosts(hosts: Vec<Host>) -> Result<Vec<Host>> {
    let mut seen = HashSet::with_capacity(hosts.len());
    hosts
        .into_iter()
        .map(|host| {
            let normalized = address::validate(&host.address).map_err(|e| {
                Error::inventory(format!("invalid host {:?}: {}", host.address, e))
            })?;
            if !seen.insert(normalized.clone()) {
                return Err(Error::inventory(format!(
                    "Duplicate address in inventory: {}",
                    normalized
                )));
            }
            Ok(Host::new(normalized, host.description))
        })
        .collect()
}
