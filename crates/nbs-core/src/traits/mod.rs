//! Core traits for the reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RecordStore`]: Query and mutate address records in the remote IPAM service
//! - [`HostSource`]: Load the desired host list

pub mod host_source;
pub mod record_store;

pub use host_source::{Host, HostSource};
pub use record_store::{Lookup, RecordStore, RecordStoreFactory, RemoteRecord};
