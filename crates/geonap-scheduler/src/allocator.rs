//! Greedy price-ordered GPU allocator

use geonap_core::{AllocationLine, Placement, RankedProvider, Tier};
use tracing::{debug, info, warn};

use crate::feasibility::Feasibility;
use crate::placement::PlacementStrategy;

/// Fills demand from the cheapest effective price upwards
///
/// Admissible providers are used first; rejected providers form a fallback
/// tier that only receives demand the admissible tier could not cover.
/// Equal prices keep catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAllocator;

impl GreedyAllocator {
    /// Allocate `required_gpus` across both tiers
    pub fn allocate(&self, feasibility: &Feasibility, required_gpus: u32) -> Placement {
        let mut placement = Placement::default();
        let mut remaining = required_gpus;

        remaining = fill(&feasibility.admissible, Tier::Admissible, remaining, &mut placement);
        if remaining > 0 && !feasibility.rejected.is_empty() {
            debug!(remaining = remaining, "Admissible capacity exhausted, using fallback tier");
            remaining = fill(&feasibility.rejected, Tier::Fallback, remaining, &mut placement);
        }

        placement.unmet_demand = remaining;

        if remaining > 0 {
            warn!(
                required = required_gpus,
                allocated = placement.allocated(),
                unmet = remaining,
                "Not enough capacity to place all GPUs"
            );
        }

        info!(
            required = required_gpus,
            allocated = placement.allocated(),
            fallback = placement.fallback_gpus(),
            "Placement computed"
        );

        placement
    }
}

impl PlacementStrategy for GreedyAllocator {
    fn place(&self, feasibility: &Feasibility, required_gpus: u32) -> Placement {
        self.allocate(feasibility, required_gpus)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Providers ordered by effective price; the sort is stable
pub fn by_effective_price(providers: &[RankedProvider]) -> Vec<&RankedProvider> {
    let mut ordered: Vec<&RankedProvider> = providers.iter().collect();
    ordered.sort_by(|a, b| a.effective_price.total_cmp(&b.effective_price));
    ordered
}

fn fill(
    providers: &[RankedProvider],
    tier: Tier,
    mut remaining: u32,
    placement: &mut Placement,
) -> u32 {
    for provider in by_effective_price(providers) {
        if remaining == 0 {
            break;
        }
        let gpus = provider.offer.capacity.min(remaining);
        if gpus == 0 {
            continue;
        }
        remaining -= gpus;

        debug!(
            provider = %provider.offer.id,
            gpus = gpus,
            effective_price = provider.effective_price,
            tier = %tier,
            "Allocated GPUs"
        );

        placement.lines.push(AllocationLine {
            provider: provider.offer.id.clone(),
            gpu_model: provider.offer.gpu_model.clone(),
            gpus,
            capacity: provider.offer.capacity,
            price: provider.offer.price,
            effective_price: provider.effective_price,
            rtt_ms: provider.offer.rtt_ms,
            bandwidth_gbps: provider.offer.bandwidth_gbps,
            tier,
        });
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonap_core::ProviderOffer;

    fn ranked(id: &str, capacity: u32, effective_price: f64, rtt_ms: f64) -> RankedProvider {
        RankedProvider {
            offer: ProviderOffer {
                id: id.to_string(),
                provider: id.split('_').next().unwrap_or(id).to_string(),
                region: "r".to_string(),
                price: effective_price,
                rtt_ms,
                bandwidth_gbps: 10.0,
                gpu_model: "A100".to_string(),
                capacity,
            },
            network_penalty: 1.0,
            effective_price,
        }
    }

    #[test]
    fn test_cheapest_first() {
        let providers = vec![
            ranked("aws_a", 32, 1.0, 5.0),
            ranked("gcp_b", 32, 1.2, 5.0),
            ranked("vast_c", 8, 0.5, 5.0),
        ];
        let feasibility = Feasibility::partition(&providers, 10.0, None);
        let placement = GreedyAllocator.allocate(&feasibility, 40);

        assert_eq!(placement.allocated(), 40);
        assert_eq!(placement.get("vast_c"), 8);
        assert_eq!(placement.get("aws_a"), 32);
        assert_eq!(placement.get("gcp_b"), 0);
        assert_eq!(placement.unmet_demand, 0);
        assert!(feasibility.forbidden().is_empty());
    }

    #[test]
    fn test_fallback_unused_when_admissible_suffices() {
        let providers = vec![
            ranked("aws_near", 32, 2.0, 5.0),
            ranked("vast_far", 8, 0.3, 150.0),
        ];
        let feasibility = Feasibility::partition(&providers, 20.0, None);
        let placement = GreedyAllocator.allocate(&feasibility, 10);

        assert_eq!(placement.get("aws_near"), 10);
        assert_eq!(placement.get("vast_far"), 0);
        assert_eq!(placement.fallback_gpus(), 0);
        assert_eq!(feasibility.forbidden(), vec!["vast_far"]);
    }

    #[test]
    fn test_fallback_tier_covers_shortfall() {
        let providers = vec![
            ranked("aws_near", 8, 2.0, 5.0),
            ranked("gcp_far", 32, 1.5, 90.0),
            ranked("vast_far", 8, 0.3, 150.0),
        ];
        let feasibility = Feasibility::partition(&providers, 20.0, None);
        let placement = GreedyAllocator.allocate(&feasibility, 20);

        assert_eq!(placement.allocated(), 20);
        assert_eq!(placement.lines[0].provider, "aws_near");
        assert_eq!(placement.lines[0].tier, Tier::Admissible);
        // fallback also goes cheapest first
        assert_eq!(placement.get("vast_far"), 8);
        assert_eq!(placement.get("gcp_far"), 4);
        assert_eq!(placement.fallback_gpus(), 12);
    }

    #[test]
    fn test_insufficient_capacity_reports_unmet_demand() {
        let providers = vec![ranked("vast_a", 8, 0.5, 5.0), ranked("vast_b", 8, 0.6, 50.0)];
        let feasibility = Feasibility::partition(&providers, 10.0, None);
        let placement = GreedyAllocator.allocate(&feasibility, 20);

        assert_eq!(placement.allocated(), 16);
        assert_eq!(placement.unmet_demand, 4);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let providers = vec![
            ranked("first_r", 8, 1.0, 5.0),
            ranked("second_r", 8, 1.0, 5.0),
            ranked("third_r", 8, 1.0, 5.0),
        ];
        let feasibility = Feasibility::partition(&providers, 10.0, None);
        let placement = GreedyAllocator.allocate(&feasibility, 12);

        assert_eq!(placement.get("first_r"), 8);
        assert_eq!(placement.get("second_r"), 4);
        assert_eq!(placement.get("third_r"), 0);
    }

    #[test]
    fn test_conservation() {
        let providers = vec![
            ranked("a_r", 32, 1.3, 5.0),
            ranked("b_r", 8, 0.9, 40.0),
            ranked("c_r", 32, 2.2, 12.0),
        ];
        let total: u32 = providers.iter().map(|p| p.offer.capacity).sum();
        for r_max in [0.0, 10.0, 50.0] {
            let feasibility = Feasibility::partition(&providers, r_max, None);
            for required in [1, 7, 40, 72, 100] {
                let placement = GreedyAllocator.allocate(&feasibility, required);
                assert!(placement.allocated() <= required);
                if total >= required {
                    assert_eq!(placement.allocated(), required);
                }
                assert_eq!(placement.allocated() + placement.unmet_demand, required);
                for line in &placement.lines {
                    assert!(line.gpus <= line.capacity);
                }
            }
        }
    }
}
