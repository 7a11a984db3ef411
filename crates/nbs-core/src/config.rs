//! Configuration types for the reconciler
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::traits::Host;

/// Tag applied when none is configured
pub const DEFAULT_TAG: &str = "nbs";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Record store configuration
    pub store: StoreConfig,

    /// Desired host inventory
    pub inventory: InventoryConfig,

    /// Scope tag marking the records this reconciler owns
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Delete tagged records that are no longer in the inventory
    #[serde(default)]
    pub cleanup: bool,

    /// Log intended mutations without applying them
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Create a configuration with the default tag, cleanup and dry-run off
    pub fn new(store: StoreConfig, inventory: InventoryConfig) -> Self {
        Self {
            store,
            inventory,
            tag: default_tag(),
            cleanup: false,
            dry_run: false,
        }
    }

    /// Set the scope tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Enable or disable garbage collection
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tag.trim().is_empty() {
            return Err(crate::Error::config("Scope tag cannot be empty"));
        }
        if self.tag.chars().any(char::is_whitespace) {
            return Err(crate::Error::config(format!(
                "Scope tag cannot contain whitespace: '{}'",
                self.tag
            )));
        }

        self.store.validate()?;
        self.inventory.validate()?;

        Ok(())
    }
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// NetBox IPAM
    Netbox {
        /// Base URL of the NetBox instance (e.g. "https://netbox.example.com")
        url: String,
        /// API token
        token: String,
        /// Verify the server's TLS certificate
        #[serde(default = "default_tls_verify")]
        tls_verify: bool,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Netbox { url, token, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("NetBox URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "NetBox URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if token.is_empty() {
                    return Err(crate::Error::config("NetBox API token cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Netbox { .. } => "netbox",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

fn default_tls_verify() -> bool {
    true
}

/// Desired host inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryConfig {
    /// Hosts file, one `address description` pair per line
    File {
        /// Path to the hosts file
        path: String,
    },

    /// Hosts listed directly in the configuration
    Inline {
        /// The desired hosts
        hosts: Vec<Host>,
    },
}

impl InventoryConfig {
    /// Validate the inventory configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            InventoryConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Hosts file path cannot be empty"));
                }
                Ok(())
            }
            InventoryConfig::Inline { .. } => Ok(()),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig::Inline { hosts: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn netbox(url: &str, token: &str) -> StoreConfig {
        StoreConfig::Netbox {
            url: url.to_string(),
            token: token.to_string(),
            tls_verify: true,
        }
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new(StoreConfig::Memory, InventoryConfig::default());
        assert_eq!(config.tag, "nbs");
        assert!(!config.cleanup);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tag_validation() {
        let config = SyncConfig::new(StoreConfig::Memory, InventoryConfig::default());
        assert!(config.clone().with_tag("").validate().is_err());
        assert!(config.clone().with_tag("two words").validate().is_err());
        assert!(config.with_tag("scanner").validate().is_ok());
    }

    #[test]
    fn test_netbox_validation() {
        assert!(netbox("https://netbox.local", "abc").validate().is_ok());
        assert!(netbox("", "abc").validate().is_err());
        assert!(netbox("netbox.local", "abc").validate().is_err());
        assert!(netbox("https://netbox.local", "").validate().is_err());
    }

    #[test]
    fn test_inventory_validation() {
        let file = InventoryConfig::File {
            path: String::new(),
        };
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: SyncConfig = serde_json::from_value(serde_json::json!({
            "store": { "type": "netbox", "url": "https://netbox.local", "token": "t" },
            "inventory": { "type": "inline", "hosts": [
                { "address": "10.0.0.1", "description": "Gateway" }
            ]},
            "cleanup": true
        }))
        .unwrap();

        assert_eq!(config.tag, "nbs");
        assert!(config.cleanup);
        assert_eq!(config.store.type_name(), "netbox");
        match config.store {
            StoreConfig::Netbox { tls_verify, .. } => assert!(tls_verify),
            _ => panic!("expected netbox store"),
        }
    }
}
