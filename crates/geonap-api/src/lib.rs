//! geonap-api: REST API server for Geo-NAP
//!
//! This crate provides the REST API for the placement engine:
//! - Planning, comparison and cost simulation
//! - Provider and model listing
//! - Catalog reload and status

pub mod rest;

pub use rest::{cors_layer, create_router, AppState};
