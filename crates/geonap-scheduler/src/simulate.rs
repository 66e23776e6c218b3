//! Monte Carlo spread of a planned cost

use geonap_core::{GeoNapError, GeoNapResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of samples
pub const DEFAULT_RUNS: usize = 500;
/// Upper bound on samples per simulation
pub const MAX_RUNS: usize = 100_000;
/// Standard deviation as a fraction of the mean
pub const RELATIVE_SPREAD: f64 = 0.2;

/// Summary of simulated cost samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSimulation {
    pub mean_input: f64,
    pub runs: usize,
    pub seed: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

/// Draw `runs` normal samples around `mean` with a 20% spread
///
/// The same seed always yields the same summary. `runs` of 0 is treated as 1
/// and anything above [`MAX_RUNS`] is clamped to it.
pub fn simulate_cost(mean: f64, runs: usize, seed: u64) -> GeoNapResult<CostSimulation> {
    if !mean.is_finite() {
        return Err(GeoNapError::Data(format!(
            "cost to simulate must be finite, got {}",
            mean
        )));
    }
    if runs > MAX_RUNS {
        warn!(requested = runs, max = MAX_RUNS, "Clamping simulation runs");
    }
    let runs = runs.clamp(1, MAX_RUNS);
    let normal = Normal::new(mean, mean.abs() * RELATIVE_SPREAD)
        .map_err(|e| GeoNapError::Data(format!("invalid cost distribution: {}", e)))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples: Vec<f64> = (0..runs).map(|_| normal.sample(&mut rng)).collect();
    samples.sort_by(|a, b| a.total_cmp(b));

    let n = samples.len() as f64;
    let sample_mean = samples.iter().sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|s| (s - sample_mean).powi(2))
        .sum::<f64>()
        / n;

    let summary = CostSimulation {
        mean_input: mean,
        runs,
        seed,
        mean: sample_mean,
        std_dev: variance.sqrt(),
        p10: percentile(&samples, 10.0),
        p50: percentile(&samples, 50.0),
        p90: percentile(&samples, 90.0),
        min: samples[0],
        max: samples[samples.len() - 1],
    };

    debug!(
        runs = runs,
        seed = seed,
        mean = summary.mean,
        p90 = summary.p90,
        "Cost simulation complete"
    );

    Ok(summary)
}

/// Linear-interpolated percentile of sorted samples
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_summary() {
        let a = simulate_cost(1000.0, DEFAULT_RUNS, 7).unwrap();
        let b = simulate_cost(1000.0, DEFAULT_RUNS, 7).unwrap();
        assert_eq!(a, b);

        let c = simulate_cost(1000.0, DEFAULT_RUNS, 8).unwrap();
        assert_ne!(a.p50, c.p50);
    }

    #[test]
    fn test_summary_is_ordered_and_centered() {
        let sim = simulate_cost(1000.0, 5000, 42).unwrap();
        assert!(sim.min <= sim.p10);
        assert!(sim.p10 <= sim.p50);
        assert!(sim.p50 <= sim.p90);
        assert!(sim.p90 <= sim.max);
        assert!((sim.mean - 1000.0).abs() < 20.0);
        assert!((sim.std_dev - 200.0).abs() < 20.0);
    }

    #[test]
    fn test_zero_mean_has_no_spread() {
        let sim = simulate_cost(0.0, 100, 1).unwrap();
        assert_eq!(sim.std_dev, 0.0);
        assert_eq!(sim.min, 0.0);
        assert_eq!(sim.max, 0.0);
    }

    #[test]
    fn test_zero_runs_draws_one_sample() {
        let sim = simulate_cost(10.0, 0, 3).unwrap();
        assert_eq!(sim.runs, 1);
        assert_eq!(sim.min, sim.max);
    }

    #[test]
    fn test_runs_clamped_to_max() {
        let sim = simulate_cost(100.0, usize::MAX, 1).unwrap();
        assert_eq!(sim.runs, MAX_RUNS);
        assert!(sim.min <= sim.p50 && sim.p50 <= sim.max);

        let at_max = simulate_cost(100.0, MAX_RUNS, 1).unwrap();
        assert_eq!(sim, at_max);
    }

    #[test]
    fn test_non_finite_mean_rejected() {
        assert!(simulate_cost(f64::NAN, 10, 0).is_err());
        assert!(simulate_cost(f64::INFINITY, 10, 0).is_err());
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 50.0), 20.0);
        assert_eq!(percentile(&sorted, 10.0), 4.0);
        assert_eq!(percentile(&sorted, 100.0), 40.0);
    }
}
