//! Step counts, per-step compute/communication time and wall-clock hours

use geonap_core::{JobSpec, Placement, Topology, UsedProvider};
use serde::Serialize;
use tracing::debug;

/// Floor for the per-step data volume when deriving steps per epoch
const MIN_STEP_VOLUME_GB: f64 = 1e-9;
/// Floor for the average bandwidth in Gbps
const MIN_BANDWIDTH_GBPS: f64 = 0.1;

/// Timing figures for one placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkloadTimes {
    pub steps_per_epoch: u64,
    pub total_steps: u64,
    pub compute_time_per_step_sec: f64,
    pub comm_time_per_step_sec: f64,
    pub derived_time_hours: f64,
    /// Override when set, otherwise `derived_time_hours`
    pub total_time_hours: f64,
    pub providers_used: usize,
}

/// `ceil(dataset / max(eps, batch * sample))`
pub fn steps_per_epoch(dataset_size_gb: f64, batch_size: u32, sample_size_gb: f64) -> u64 {
    let per_step = (batch_size as f64 * sample_size_gb).max(MIN_STEP_VOLUME_GB);
    (dataset_size_gb / per_step).ceil().max(0.0) as u64
}

/// Explicit steps win; otherwise `steps_per_epoch * epochs`
pub fn total_steps(steps: u64, steps_per_epoch: u64, epochs: u32) -> u64 {
    if steps > 0 {
        steps
    } else {
        steps_per_epoch.saturating_mul(epochs as u64)
    }
}

/// Compute seconds per step; more GPUs share the model-size term
pub fn compute_time_per_step(job: &JobSpec) -> f64 {
    job.compute.base_sec_per_step
        + job.model_size_gb * job.compute.sec_per_gb_per_step / job.required_gpus.max(1) as f64
}

/// Bandwidth multiplier of the all-reduce for `p` providers
pub fn bandwidth_factor(topology: Topology, p: usize) -> f64 {
    if p == 0 {
        return 0.0;
    }
    let p = p as f64;
    match topology {
        Topology::Mesh => p - 1.0,
        Topology::Ring => 2.0 * (p - 1.0) / p,
    }
}

/// Latency multiplier of the all-reduce for `p` providers
pub fn rtt_factor(p: usize) -> f64 {
    if p == 0 {
        return 1.0;
    }
    (p as f64).log2().max(1.0)
}

/// All-reduce seconds per step across the used providers
pub fn comm_time_per_step(model_size_gb: f64, used: &[UsedProvider], topology: Topology) -> f64 {
    if used.is_empty() {
        return 0.0;
    }
    let p = used.len();
    let avg_bandwidth = used.iter().map(|u| u.bandwidth_gbps).sum::<f64>() / p as f64;
    let avg_rtt_ms = used.iter().map(|u| u.rtt_ms).sum::<f64>() / p as f64;

    model_size_gb / avg_bandwidth.max(MIN_BANDWIDTH_GBPS) * bandwidth_factor(topology, p)
        + avg_rtt_ms / 1000.0 * rtt_factor(p)
}

/// Derives training time from a job and its placement
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadTimeModel;

impl WorkloadTimeModel {
    /// Evaluate timing; an empty placement yields all zeros
    pub fn evaluate(&self, job: &JobSpec, placement: &Placement) -> WorkloadTimes {
        let used = placement.used_providers();
        if used.is_empty() {
            return WorkloadTimes::default();
        }

        let steps_per_epoch = steps_per_epoch(job.dataset_size_gb, job.batch_size, job.sample_size_gb);
        let total_steps = total_steps(job.steps, steps_per_epoch, job.epochs);
        let compute = compute_time_per_step(job);
        let comm = comm_time_per_step(job.model_size_gb, &used, job.topology);
        let derived_time_hours = total_steps as f64 * (compute + comm) / 3600.0;
        let total_time_hours = job.hours_override().unwrap_or(derived_time_hours);

        debug!(
            steps_per_epoch = steps_per_epoch,
            total_steps = total_steps,
            compute_sec = compute,
            comm_sec = comm,
            providers = used.len(),
            topology = %job.topology,
            hours = total_time_hours,
            "Workload time evaluated"
        );

        WorkloadTimes {
            steps_per_epoch,
            total_steps,
            compute_time_per_step_sec: compute,
            comm_time_per_step_sec: comm,
            derived_time_hours,
            total_time_hours,
            providers_used: used.len(),
        }
    }
}
