//! geonap-scheduler: network-aware GPU placement and cost accounting
//!
//! This crate turns a provider catalog and a training job into a costed plan:
//! - Catalog validation and network-adjusted pricing
//! - Latency feasibility and greedy placement
//! - Training time and cost accounting
//! - Cost comparison and Monte Carlo simulation

pub mod accounting;
pub mod allocator;
pub mod catalog;
pub mod feasibility;
pub mod placement;
pub mod planner;
pub mod simulate;
pub mod time_model;

pub use accounting::CostAccountant;
pub use allocator::GreedyAllocator;
pub use catalog::{ModelAvailability, ProviderCatalog};
pub use feasibility::Feasibility;
pub use placement::PlacementStrategy;
pub use planner::{Comparison, Planner};
pub use simulate::{simulate_cost, CostSimulation, DEFAULT_RUNS, MAX_RUNS};
pub use time_model::{WorkloadTimeModel, WorkloadTimes};
