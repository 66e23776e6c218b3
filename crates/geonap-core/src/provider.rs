//! Provider offer types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw provider record as written by the discovery scrapers
///
/// Numeric fields are kept as JSON values so that strings, nulls and other
/// scraper quirks can be coerced instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider family (e.g., "aws", "vast")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Region name (e.g., "ap-south-1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Hourly price in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    /// Round-trip time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtt: Option<Value>,
    /// Bandwidth in Gbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Value>,
    /// Accelerator model (e.g., "H100")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
}

impl ProviderRecord {
    /// Create a record with the required fields
    pub fn new(provider: &str, region: &str, price: f64) -> Self {
        Self {
            provider: Some(provider.to_string()),
            region: Some(region.to_string()),
            price: Some(Value::from(price)),
            ..Default::default()
        }
    }

    /// Set the round-trip time
    pub fn with_rtt(mut self, rtt_ms: f64) -> Self {
        self.rtt = Some(Value::from(rtt_ms));
        self
    }

    /// Set the bandwidth
    pub fn with_bandwidth(mut self, bandwidth_gbps: f64) -> Self {
        self.bandwidth = Some(Value::from(bandwidth_gbps));
        self
    }

    /// Set the accelerator model
    pub fn with_gpu(mut self, gpu: &str) -> Self {
        self.gpu = Some(gpu.to_string());
        self
    }
}

/// Compose the provider identifier used throughout placement and costing
pub fn provider_id(provider: &str, region: &str) -> String {
    format!("{}_{}", provider, region)
}

/// A validated provider offer with defaults filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOffer {
    /// Identifier: `provider_region`
    pub id: String,
    /// Provider family
    pub provider: String,
    /// Region name
    pub region: String,
    /// Raw hourly price in USD
    pub price: f64,
    /// Round-trip time in milliseconds
    pub rtt_ms: f64,
    /// Bandwidth in Gbps
    pub bandwidth_gbps: f64,
    /// Accelerator model
    pub gpu_model: String,
    /// GPUs this offer can supply
    pub capacity: u32,
}

/// A provider offer priced for network quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProvider {
    /// Underlying offer
    #[serde(flatten)]
    pub offer: ProviderOffer,
    /// Multiplier applied to the raw price (always >= 1)
    pub network_penalty: f64,
    /// Raw price × network penalty
    pub effective_price: f64,
}

impl RankedProvider {
    /// Provider identifier
    pub fn id(&self) -> &str {
        &self.offer.id
    }

    /// Whether the accelerator model matches a case-insensitive substring filter
    pub fn offers_model(&self, filter: &str) -> bool {
        self.offer
            .gpu_model
            .to_lowercase()
            .contains(&filter.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = ProviderRecord::new("aws", "us-east-1", 2.5)
            .with_rtt(12.0)
            .with_gpu("A100");
        assert_eq!(record.provider.as_deref(), Some("aws"));
        assert_eq!(record.price, Some(Value::from(2.5)));
        assert!(record.bandwidth.is_none());
    }

    #[test]
    fn test_record_parse_sparse() {
        let json = r#"{"provider": "runpod", "region": "global", "price": "0.79", "bandwidth": 10}"#;
        let record: ProviderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.gpu, None);
        assert_eq!(record.rtt, None);
        assert_eq!(record.price, Some(Value::from("0.79")));
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(provider_id("vast", "us-east"), "vast_us-east");
    }

    #[test]
    fn test_offers_model() {
        let ranked = RankedProvider {
            offer: ProviderOffer {
                id: "aws_us-east-1".to_string(),
                provider: "aws".to_string(),
                region: "us-east-1".to_string(),
                price: 1.0,
                rtt_ms: 10.0,
                bandwidth_gbps: 10.0,
                gpu_model: "NVIDIA H100 80GB".to_string(),
                capacity: 32,
            },
            network_penalty: 1.0,
            effective_price: 1.0,
        };
        assert!(ranked.offers_model("h100"));
        assert!(!ranked.offers_model("a100"));
    }
}
