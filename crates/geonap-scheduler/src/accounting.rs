//! Cost accounting: compute time, dataset egress and synchronisation traffic

use geonap_core::{CostBreakdown, EgressPolicy, JobSpec, PairwiseCost, Placement};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::time_model::WorkloadTimes;

/// Floor for link bandwidth when computing the inter-provider penalty
const MIN_LINK_GBPS: f64 = 0.1;

/// Turns a placement and its timing into a cost breakdown
#[derive(Debug, Clone, Default)]
pub struct CostAccountant {
    policy: EgressPolicy,
}

impl CostAccountant {
    pub fn new(policy: EgressPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EgressPolicy {
        &self.policy
    }

    /// Egress rate in USD/GB for a provider identifier or token
    ///
    /// Overrides are consulted first: exact identifier, then the provider
    /// name before the first `_`, then the longest override key contained in
    /// the identifier. Without an override the brand table applies.
    pub fn resolve_rate(&self, identifier: &str, overrides: &BTreeMap<String, f64>) -> f64 {
        let identifier = identifier.to_lowercase();
        let provider = identifier.split('_').next().unwrap_or(&identifier);

        let lookup = |key: &str| {
            overrides
                .iter()
                .find(|(k, _)| k.to_lowercase() == key)
                .map(|(_, rate)| *rate)
        };

        lookup(identifier.as_str())
            .or_else(|| lookup(provider))
            .or_else(|| {
                overrides
                    .iter()
                    .filter(|(k, _)| !k.is_empty() && identifier.contains(&k.to_lowercase()))
                    .max_by_key(|(k, _)| k.len())
                    .map(|(_, rate)| *rate)
            })
            .unwrap_or_else(|| self.policy.rates.lookup(&identifier))
    }

    /// Produce the full breakdown; an empty placement costs nothing
    pub fn account(&self, job: &JobSpec, placement: &Placement, times: &WorkloadTimes) -> CostBreakdown {
        let used = placement.used_providers();
        if used.is_empty() {
            return CostBreakdown::default();
        }

        let hours = times.total_time_hours;
        let steps = times.total_steps as f64;

        let compute_cost: f64 = placement
            .lines
            .iter()
            .map(|l| l.gpus as f64 * l.effective_price * hours)
            .sum();

        let rates: BTreeMap<String, f64> = used
            .iter()
            .map(|u| (u.id.clone(), self.resolve_rate(&u.id, &job.egress_overrides)))
            .collect();

        let source = job.data_source.trim().to_lowercase();
        let source_rate = self.resolve_rate(&source, &job.egress_overrides);
        let remote_consumers = used
            .iter()
            .filter(|u| source.is_empty() || !u.id.to_lowercase().contains(&source))
            .count();
        let egress_cost = remote_consumers as f64 * job.dataset_size_gb * steps * source_rate;

        let volume_gb = job.model_size_gb * steps;
        let mut pairwise_costs = Vec::new();
        let mut inter_provider_cost = 0.0;
        for src in &used {
            for dst in &used {
                if src.id == dst.id {
                    continue;
                }
                let egress_rate = rates.get(&src.id).copied().unwrap_or(self.policy.rates.default);
                let slowest = src.bandwidth_gbps.min(dst.bandwidth_gbps).max(MIN_LINK_GBPS);
                let bandwidth_penalty = self.policy.baseline_bandwidth_gbps / slowest;
                let cost = volume_gb * egress_rate * bandwidth_penalty;

                debug!(
                    src = %src.id,
                    dst = %dst.id,
                    cost = cost,
                    penalty = bandwidth_penalty,
                    "Inter-provider flow"
                );

                inter_provider_cost += cost;
                pairwise_costs.push(PairwiseCost {
                    src: src.id.clone(),
                    dst: dst.id.clone(),
                    volume_gb,
                    egress_rate,
                    bandwidth_penalty,
                    cost,
                });
            }
        }

        let total_cost = compute_cost + egress_cost + inter_provider_cost;
        let cost_per_epoch = total_cost / job.epochs.max(1) as f64;

        info!(
            total_cost = total_cost,
            compute_cost = compute_cost,
            egress_cost = egress_cost,
            inter_provider_cost = inter_provider_cost,
            hours = hours,
            "Cost breakdown computed"
        );

        CostBreakdown {
            compute_cost,
            egress_cost,
            inter_provider_cost,
            total_cost,
            cost_per_epoch,
            total_time_hours: hours,
            derived_time_hours: times.derived_time_hours,
            compute_time_per_step_sec: times.compute_time_per_step_sec,
            comm_time_per_step_sec: times.comm_time_per_step_sec,
            steps_per_epoch: times.steps_per_epoch,
            total_steps: times.total_steps,
            providers_used: used.len(),
            model_size_gb: job.model_size_gb,
            dataset_size_gb: job.dataset_size_gb,
            egress_rate_source: source_rate,
            egress_rate_by_provider: rates,
            pairwise_costs,
        }
    }
}
