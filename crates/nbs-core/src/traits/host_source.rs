// # Host Source Trait
//
// Defines the interface for loading the desired host list.
//
// ## Implementations
//
// - Hosts file: `nbs_core::inventory::FileHostSource`
// - Inline list: `nbs_core::inventory::StaticHostSource`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A host that should exist in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    /// Host address, unique within a desired list
    pub address: String,
    /// Description to store on the record
    pub description: String,
}

impl Host {
    /// Create a new host
    pub fn new(address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: description.into(),
        }
    }
}

impl<A: Into<String>, D: Into<String>> From<(A, D)> for Host {
    fn from((address, description): (A, D)) -> Self {
        Self::new(address, description)
    }
}

/// Trait for desired-state inventories
///
/// A source returns the complete, ordered host list in one call. Addresses
/// are validated and unique by the time they leave the source.
#[async_trait]
pub trait HostSource: Send + Sync {
    /// Load the desired host list
    async fn hosts(&self) -> Result<Vec<Host>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
