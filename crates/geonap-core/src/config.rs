//! Configuration types for Geo-NAP

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::job::JobRequest;
use crate::policy::{default_capacity_table, default_egress_table, BrandTable};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// API server configuration
    pub api: ApiConfig,
    /// Provider normalisation policy
    pub catalog: CatalogPolicy,
    /// Egress pricing policy
    pub egress: EgressPolicy,
    /// Provider cache location
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, crate::GeoNapError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::GeoNapError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| crate::GeoNapError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the REST API server
    pub rest_address: String,
    /// Port for the REST API server
    pub rest_port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_address: "0.0.0.0".to_string(),
            rest_port: 9090,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// How raw provider records become ranked providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPolicy {
    /// Latency weight in the network penalty (per ms)
    pub alpha: f64,
    /// Bandwidth weight in the network penalty (Gbps)
    pub beta: f64,
    /// RTT assumed when a record has none
    pub default_rtt_ms: f64,
    /// Bandwidth assumed when a record has none
    pub default_bandwidth_gbps: f64,
    /// GPU capacity per provider family
    pub capacity: BrandTable<u32>,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            beta: 0.5,
            default_rtt_ms: 30.0,
            default_bandwidth_gbps: 10.0,
            capacity: default_capacity_table(),
        }
    }
}

/// Egress pricing policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EgressPolicy {
    /// Default USD/GB per provider family
    pub rates: BrandTable<f64>,
    /// Link speed at which the inter-provider bandwidth penalty is 1
    pub baseline_bandwidth_gbps: f64,
}

impl Default for EgressPolicy {
    fn default() -> Self {
        Self {
            rates: default_egress_table(),
            baseline_bandwidth_gbps: 10.0,
        }
    }
}

/// Provider cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path to the providers JSON document
    pub providers_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            providers_path: PathBuf::from("cache/providers.json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Job file format (TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    /// Job settings
    pub job: JobRequest,
}

impl JobFile {
    /// Load a job file
    pub fn from_file(path: &Path) -> Result<Self, crate::GeoNapError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::GeoNapError::Config(format!("Failed to read job file: {}", e))
        })?;
        Ok(toml::from_str(&content)?)
    }
}
