//! geonap-store: Provider cache loading
//!
//! This crate provides access to the scraped provider cache:
//! - Provider sources (JSON cache file, in-memory records)
//! - Validated catalog snapshots
//! - Reloadable provider store

pub mod snapshot;
pub mod source;

pub use snapshot::{CatalogSnapshot, ProviderStore, SnapshotInfo};
pub use source::{JsonFileSource, MemorySource, ProviderSource};
