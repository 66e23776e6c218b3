//! geonap-core: Core types for the Geo-NAP placement engine
//!
//! This crate provides the fundamental types used throughout Geo-NAP:
//! - Provider records and ranked offers
//! - Training job specifications and their lenient wire form
//! - Placement and cost breakdown results
//! - Brand-keyword policy tables
//! - Configuration types
//! - Error handling

pub mod coerce;
pub mod config;
pub mod error;
pub mod job;
pub mod plan;
pub mod policy;
pub mod provider;

pub use config::*;
pub use error::*;
pub use job::*;
pub use plan::*;
pub use policy::*;
pub use provider::*;
