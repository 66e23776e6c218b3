//! Placement strategies

use geonap_core::Placement;

use crate::feasibility::Feasibility;

/// Strategy for turning feasible providers into a GPU placement
pub trait PlacementStrategy: Send + Sync {
    /// Place `required_gpus` across the admissible tier, then the fallback tier
    fn place(&self, feasibility: &Feasibility, required_gpus: u32) -> Placement;

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::GreedyAllocator;
    use std::sync::Arc;

    #[test]
    fn test_strategy_object() {
        let strategy: Arc<dyn PlacementStrategy> = Arc::new(GreedyAllocator);
        assert_eq!(strategy.name(), "greedy");

        let placement = strategy.place(&Feasibility::default(), 4);
        assert!(placement.is_empty());
        assert_eq!(placement.unmet_demand, 4);
    }
}
