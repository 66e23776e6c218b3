//! Latency and hardware feasibility filtering

use geonap_core::{normalize_model_filter, RankedProvider};
use tracing::debug;

/// Providers split by the latency bound
#[derive(Debug, Clone, Default)]
pub struct Feasibility {
    /// Providers with rtt <= r_max, in catalog order
    pub admissible: Vec<RankedProvider>,
    /// Providers with rtt > r_max, in catalog order
    pub rejected: Vec<RankedProvider>,
}

impl Feasibility {
    /// Partition providers by latency after applying an optional model filter
    ///
    /// The model filter is a case-insensitive substring; `None`, an empty
    /// string or `any` keep every provider.
    pub fn partition(providers: &[RankedProvider], r_max: f64, model_filter: Option<&str>) -> Self {
        let filter = model_filter.and_then(normalize_model_filter);

        let (admissible, rejected): (Vec<_>, Vec<_>) = providers
            .iter()
            .filter(|p| filter.map_or(true, |f| p.offers_model(f)))
            .cloned()
            .partition(|p| p.offer.rtt_ms <= r_max);

        debug!(
            r_max = r_max,
            model_filter = filter.unwrap_or("any"),
            admissible = admissible.len(),
            rejected = rejected.len(),
            "Providers partitioned"
        );

        Self {
            admissible,
            rejected,
        }
    }

    /// Identifiers rejected by the latency bound
    pub fn forbidden(&self) -> Vec<String> {
        self.rejected.iter().map(|p| p.offer.id.clone()).collect()
    }

    /// Size of the filtered working set
    pub fn working_set_len(&self) -> usize {
        self.admissible.len() + self.rejected.len()
    }

    /// Capacity across both tiers
    pub fn total_capacity(&self) -> u64 {
        self.admissible
            .iter()
            .chain(self.rejected.iter())
            .map(|p| p.offer.capacity as u64)
            .sum()
    }
}
