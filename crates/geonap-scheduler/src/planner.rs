//! Planning pipeline: catalog, feasibility, placement, timing and cost

use geonap_core::{
    CatalogPolicy, CostBreakdown, CostDelta, EngineConfig, GeoNapResult, JobSpec, PlanOutcome,
    ProviderRecord, RankedProvider,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::accounting::CostAccountant;
use crate::allocator::GreedyAllocator;
use crate::catalog::ProviderCatalog;
use crate::feasibility::Feasibility;
use crate::placement::PlacementStrategy;
use crate::time_model::WorkloadTimeModel;

/// Stateless planner holding only policy configuration
#[derive(Clone)]
pub struct Planner {
    catalog_policy: CatalogPolicy,
    accountant: CostAccountant,
    strategy: Arc<dyn PlacementStrategy>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("catalog_policy", &self.catalog_policy)
            .field("accountant", &self.accountant)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl Planner {
    /// Create a planner from engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            catalog_policy: config.catalog.clone(),
            accountant: CostAccountant::new(config.egress.clone()),
            strategy: Arc::new(GreedyAllocator),
        }
    }

    /// Replace the placement strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn PlacementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn catalog_policy(&self) -> &CatalogPolicy {
        &self.catalog_policy
    }

    pub fn accountant(&self) -> &CostAccountant {
        &self.accountant
    }

    /// Build a catalog from raw records with this planner's policy
    pub fn catalog(&self, records: &[ProviderRecord]) -> GeoNapResult<ProviderCatalog> {
        ProviderCatalog::build(records, &self.catalog_policy)
    }

    /// Plan a job against raw provider records
    pub fn plan(&self, job: &JobSpec, records: &[ProviderRecord]) -> GeoNapResult<PlanOutcome> {
        let catalog = self.catalog(records)?;
        Ok(self.plan_ranked(job, catalog.providers()))
    }

    /// Plan a job against an already-ranked catalog
    pub fn plan_ranked(&self, job: &JobSpec, providers: &[RankedProvider]) -> PlanOutcome {
        let feasibility = Feasibility::partition(providers, job.max_rtt_ms, job.model_filter());
        let placement = self.strategy.place(&feasibility, job.required_gpus);
        let forbidden = feasibility.forbidden();

        let breakdown = if placement.is_empty() {
            CostBreakdown::default()
        } else {
            let times = WorkloadTimeModel.evaluate(job, &placement);
            self.accountant.account(job, &placement, &times)
        };

        info!(
            strategy = self.strategy.name(),
            required = job.required_gpus,
            allocated = placement.allocated(),
            forbidden = forbidden.len(),
            total_cost = breakdown.total_cost,
            "Plan complete"
        );

        PlanOutcome {
            total_cost: breakdown.total_cost,
            placement,
            forbidden,
            breakdown,
        }
    }

    /// Plan the job as-is and again restricted to `model`
    pub fn compare(
        &self,
        job: &JobSpec,
        records: &[ProviderRecord],
        model: &str,
    ) -> GeoNapResult<Comparison> {
        let catalog = self.catalog(records)?;
        Ok(self.compare_ranked(job, catalog.providers(), model))
    }

    /// Comparison against an already-ranked catalog
    pub fn compare_ranked(&self, job: &JobSpec, providers: &[RankedProvider], model: &str) -> Comparison {
        let base = self.plan_ranked(job, providers);
        let filtered = self.plan_ranked(&job.with_model(model), providers);
        let delta = CostDelta::between(&base.breakdown, &filtered.breakdown);

        info!(
            model = %model,
            base_cost = base.total_cost,
            filtered_cost = filtered.total_cost,
            delta = delta.total_cost,
            "Comparison complete"
        );

        Comparison {
            model: model.to_string(),
            base,
            filtered,
            delta,
        }
    }
}

/// Base run against a model-filtered run of the same job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub model: String,
    pub base: PlanOutcome,
    pub filtered: PlanOutcome,
    /// `filtered - base`
    pub delta: CostDelta,
}
