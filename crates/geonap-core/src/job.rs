//! Training job description
//!
//! [`JobRequest`] is the loosely-typed wire/file form. [`JobSpec`] is the
//! validated form the planner consumes; converting one into the other never
//! fails, out-of-range inputs are coerced to safe values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::coerce;

/// All-reduce topology used to synchronise model state each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Ring all-reduce
    #[default]
    Ring,
    /// All-pairs exchange
    Mesh,
}

impl Topology {
    /// Parse a topology name, falling back to ring for anything unknown
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "mesh" => Topology::Mesh,
            "ring" => Topology::Ring,
            other => {
                warn!(topology = other, "Unknown topology, using ring");
                Topology::Ring
            }
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Ring => write!(f, "ring"),
            Topology::Mesh => write!(f, "mesh"),
        }
    }
}

/// Per-step compute time constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeModel {
    /// Fixed seconds per step
    pub base_sec_per_step: f64,
    /// Additional seconds per GB of model per step
    pub sec_per_gb_per_step: f64,
}

impl Default for ComputeModel {
    fn default() -> Self {
        Self {
            base_sec_per_step: 0.4,
            sec_per_gb_per_step: 0.08,
        }
    }
}

/// Validated training job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// GPUs to place (>= 1)
    pub required_gpus: u32,
    /// Latency bound for admissible providers
    pub max_rtt_ms: f64,
    /// Model size in GB
    pub model_size_gb: f64,
    /// Explicit step count; 0 derives steps from dataset, batch and epochs
    pub steps: u64,
    /// Dataset size in GB
    pub dataset_size_gb: f64,
    /// Epochs (>= 1)
    pub epochs: u32,
    /// Batch size (>= 1)
    pub batch_size: u32,
    /// Size of one sample in GB
    pub sample_size_gb: f64,
    /// Provider token where the dataset lives (e.g., "aws")
    pub data_source: String,
    /// Egress rate overrides in USD/GB keyed by provider name or identifier
    pub egress_overrides: BTreeMap<String, f64>,
    /// All-reduce topology
    pub topology: Topology,
    /// Accelerator model filter (substring, case-insensitive)
    pub gpu_model: Option<String>,
    /// Wall-clock hours override; values <= 0 mean "derive"
    pub training_hours: f64,
    /// Compute time constants
    pub compute: ComputeModel,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            required_gpus: 8,
            max_rtt_ms: 20.0,
            model_size_gb: 5.0,
            steps: 0,
            dataset_size_gb: 200.0,
            epochs: 3,
            batch_size: 128,
            sample_size_gb: 0.02,
            data_source: "aws".to_string(),
            egress_overrides: BTreeMap::new(),
            topology: Topology::Ring,
            gpu_model: None,
            training_hours: 0.0,
            compute: ComputeModel::default(),
        }
    }
}

impl JobSpec {
    /// The model filter to apply, if any
    pub fn model_filter(&self) -> Option<&str> {
        self.gpu_model.as_deref().and_then(normalize_model_filter)
    }

    /// Same job restricted to one accelerator model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            gpu_model: Some(model.to_string()),
            ..self.clone()
        }
    }

    /// Training-hours override, when one is set
    pub fn hours_override(&self) -> Option<f64> {
        Some(self.training_hours).filter(|h| *h > 0.0)
    }
}

/// Treat empty strings and the "any" sentinel as "no filter"
pub fn normalize_model_filter(filter: &str) -> Option<&str> {
    let trimmed = filter.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
        None
    } else {
        Some(trimmed)
    }
}

/// Loosely-typed job request as received over HTTP or read from a job file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default, alias = "gpus")]
    pub required_gpus: Option<Value>,
    #[serde(default, alias = "r_max")]
    pub max_rtt_ms: Option<Value>,
    #[serde(default, alias = "model_size")]
    pub model_size_gb: Option<Value>,
    #[serde(default)]
    pub steps: Option<Value>,
    #[serde(default)]
    pub dataset_size_gb: Option<Value>,
    #[serde(default)]
    pub epochs: Option<Value>,
    #[serde(default)]
    pub batch_size: Option<Value>,
    #[serde(default)]
    pub sample_size_gb: Option<Value>,
    #[serde(default, alias = "data_source_provider")]
    pub data_source: Option<String>,
    #[serde(default)]
    pub egress_overrides: BTreeMap<String, Value>,
    #[serde(default)]
    pub topology: Option<String>,
    #[serde(default)]
    pub gpu_model: Option<String>,
    #[serde(default)]
    pub training_hours: Option<Value>,
    #[serde(default, alias = "base_compute_sec")]
    pub base_sec_per_step: Option<Value>,
    #[serde(default, alias = "compute_scale_per_gb")]
    pub sec_per_gb_per_step: Option<Value>,
}

impl JobRequest {
    /// Coerce into a validated [`JobSpec`]
    pub fn into_spec(self) -> JobSpec {
        let defaults = JobSpec::default();

        let required_gpus = coerce::count_at_least(
            self.required_gpus.as_ref(),
            defaults.required_gpus as u64,
            1,
        );
        if coerce::opt_number(self.required_gpus.as_ref()).is_some_and(|v| v < 1.0) {
            warn!("Non-positive GPU count requested, using 1");
        }

        let mut egress_overrides = BTreeMap::new();
        for (provider, rate) in &self.egress_overrides {
            match coerce::number(rate).filter(|r| *r >= 0.0) {
                Some(r) => {
                    egress_overrides.insert(provider.trim().to_lowercase(), r);
                }
                None => warn!(provider = %provider, "Ignoring invalid egress override"),
            }
        }

        let default_compute = ComputeModel::default();

        JobSpec {
            required_gpus: required_gpus.min(u32::MAX as u64) as u32,
            max_rtt_ms: coerce::non_negative_or(self.max_rtt_ms.as_ref(), defaults.max_rtt_ms),
            model_size_gb: coerce::non_negative_or(
                self.model_size_gb.as_ref(),
                defaults.model_size_gb,
            ),
            steps: coerce::count_at_least(self.steps.as_ref(), defaults.steps, 0),
            dataset_size_gb: coerce::non_negative_or(
                self.dataset_size_gb.as_ref(),
                defaults.dataset_size_gb,
            ),
            epochs: coerce::count_at_least(self.epochs.as_ref(), defaults.epochs as u64, 1)
                .min(u32::MAX as u64) as u32,
            batch_size: coerce::count_at_least(
                self.batch_size.as_ref(),
                defaults.batch_size as u64,
                1,
            )
            .min(u32::MAX as u64) as u32,
            sample_size_gb: coerce::non_negative_or(
                self.sample_size_gb.as_ref(),
                defaults.sample_size_gb,
            ),
            data_source: coerce::text(self.data_source.as_deref())
                .map(|s| s.to_lowercase())
                .unwrap_or(defaults.data_source),
            egress_overrides,
            topology: self
                .topology
                .as_deref()
                .map(Topology::parse_lenient)
                .unwrap_or_default(),
            gpu_model: self
                .gpu_model
                .as_deref()
                .and_then(normalize_model_filter)
                .map(str::to_string),
            training_hours: coerce::non_negative_or(self.training_hours.as_ref(), 0.0),
            compute: ComputeModel {
                base_sec_per_step: coerce::positive_or(
                    self.base_sec_per_step.as_ref(),
                    default_compute.base_sec_per_step,
                ),
                sec_per_gb_per_step: coerce::positive_or(
                    self.sec_per_gb_per_step.as_ref(),
                    default_compute.sec_per_gb_per_step,
                ),
            },
        }
    }
}

impl From<JobRequest> for JobSpec {
    fn from(request: JobRequest) -> Self {
        request.into_spec()
    }
}
