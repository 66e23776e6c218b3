//! Placement and cost breakdown types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which pass of the allocator supplied an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Provider within the latency bound
    Admissible,
    /// Provider over the latency bound, used once admissible capacity ran out
    Fallback,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Admissible => write!(f, "admissible"),
            Tier::Fallback => write!(f, "fallback"),
        }
    }
}

/// GPUs taken from one provider offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// Provider identifier
    pub provider: String,
    /// Accelerator model of the offer
    pub gpu_model: String,
    /// GPUs allocated
    pub gpus: u32,
    /// Capacity of the offer
    pub capacity: u32,
    /// Raw hourly price per GPU
    pub price: f64,
    /// Network-adjusted hourly price per GPU
    pub effective_price: f64,
    /// Round-trip time in milliseconds
    pub rtt_ms: f64,
    /// Bandwidth in Gbps
    pub bandwidth_gbps: f64,
    /// Allocation pass
    pub tier: Tier,
}

/// Provider taking part in training, with the link figures used for costing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsedProvider {
    pub id: String,
    pub gpus: u32,
    pub rtt_ms: f64,
    pub bandwidth_gbps: f64,
}

/// GPU assignment across providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Allocation lines in allocation order
    pub lines: Vec<AllocationLine>,
    /// GPUs that could not be placed anywhere
    pub unmet_demand: u32,
}

impl Placement {
    /// Total GPUs allocated
    pub fn allocated(&self) -> u32 {
        self.lines.iter().map(|l| l.gpus).sum()
    }

    /// Whether nothing was allocated
    pub fn is_empty(&self) -> bool {
        self.allocated() == 0
    }

    /// GPUs allocated to a provider identifier (0 when unused)
    pub fn get(&self, provider: &str) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.provider == provider)
            .map(|l| l.gpus)
            .sum()
    }

    /// GPUs per provider identifier
    pub fn by_provider(&self) -> BTreeMap<String, u32> {
        let mut map = BTreeMap::new();
        for line in self.lines.iter().filter(|l| l.gpus > 0) {
            *map.entry(line.provider.clone()).or_insert(0) += line.gpus;
        }
        map
    }

    /// Distinct providers with a nonzero allocation, in allocation order
    ///
    /// Link figures come from the first line allocated for each identifier.
    pub fn used_providers(&self) -> Vec<UsedProvider> {
        let mut used: Vec<UsedProvider> = Vec::new();
        for line in self.lines.iter().filter(|l| l.gpus > 0) {
            match used.iter_mut().find(|u| u.id == line.provider) {
                Some(existing) => existing.gpus += line.gpus,
                None => used.push(UsedProvider {
                    id: line.provider.clone(),
                    gpus: line.gpus,
                    rtt_ms: line.rtt_ms,
                    bandwidth_gbps: line.bandwidth_gbps,
                }),
            }
        }
        used
    }

    /// Network-adjusted USD per hour for the whole placement
    pub fn hourly_rate(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.gpus as f64 * l.effective_price)
            .sum()
    }

    /// GPUs that came from the fallback tier
    pub fn fallback_gpus(&self) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.tier == Tier::Fallback)
            .map(|l| l.gpus)
            .sum()
    }
}

/// Synchronisation traffic cost for one directed provider pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseCost {
    /// Sending provider (pays egress)
    pub src: String,
    /// Receiving provider
    pub dst: String,
    /// GB sent over the whole run
    pub volume_gb: f64,
    /// Egress rate of the sender in USD/GB
    pub egress_rate: f64,
    /// Multiplier for the slower of the two links
    pub bandwidth_penalty: f64,
    /// Cost in USD
    pub cost: f64,
}

/// Full cost and time breakdown for a placement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub compute_cost: f64,
    pub egress_cost: f64,
    pub inter_provider_cost: f64,
    pub total_cost: f64,
    pub cost_per_epoch: f64,
    /// Hours billed (override when set, otherwise derived)
    pub total_time_hours: f64,
    pub derived_time_hours: f64,
    pub compute_time_per_step_sec: f64,
    pub comm_time_per_step_sec: f64,
    pub steps_per_epoch: u64,
    pub total_steps: u64,
    pub providers_used: usize,
    pub model_size_gb: f64,
    pub dataset_size_gb: f64,
    /// Egress rate of the data source in USD/GB
    pub egress_rate_source: f64,
    /// Resolved egress rate per used provider
    pub egress_rate_by_provider: BTreeMap<String, f64>,
    /// Directed inter-provider costs
    pub pairwise_costs: Vec<PairwiseCost>,
}

impl CostBreakdown {
    /// Cost of the directed pair `src → dst`, 0 when absent
    pub fn pair_cost(&self, src: &str, dst: &str) -> f64 {
        self.pairwise_costs
            .iter()
            .find(|p| p.src == src && p.dst == dst)
            .map(|p| p.cost)
            .unwrap_or(0.0)
    }
}

/// Result of one planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub placement: Placement,
    /// Total cost in USD (same as `breakdown.total_cost`)
    pub total_cost: f64,
    /// Providers rejected by the latency bound, in catalog order
    pub forbidden: Vec<String>,
    pub breakdown: CostBreakdown,
}

/// Difference between two breakdowns (`other - base`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostDelta {
    pub total_cost: f64,
    pub compute_cost: f64,
    pub egress_cost: f64,
    pub inter_provider_cost: f64,
    pub cost_per_epoch: f64,
}

impl CostDelta {
    /// Compute `other - base` for each cost component
    pub fn between(base: &CostBreakdown, other: &CostBreakdown) -> Self {
        Self {
            total_cost: other.total_cost - base.total_cost,
            compute_cost: other.compute_cost - base.compute_cost,
            egress_cost: other.egress_cost - base.egress_cost,
            inter_provider_cost: other.inter_provider_cost - base.inter_provider_cost,
            cost_per_epoch: other.cost_per_epoch - base.cost_per_epoch,
        }
    }
}
