//! Provider catalog: validation, network-aware pricing and capacity policy

use geonap_core::{
    coerce, provider_id, CatalogPolicy, GeoNapError, GeoNapResult, Placement, ProviderOffer,
    ProviderRecord, RankedProvider,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Accelerator model placeholder for records without one
pub const UNKNOWN_MODEL: &str = "unknown";

/// Immutable set of ranked providers built from one cache snapshot
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<RankedProvider>,
}

impl ProviderCatalog {
    /// Validate and rank raw records
    ///
    /// Fails on the first record missing `provider`, `region` or a usable
    /// `price`; no partial catalog is produced.
    pub fn build(records: &[ProviderRecord], policy: &CatalogPolicy) -> GeoNapResult<Self> {
        let providers = records
            .iter()
            .enumerate()
            .map(|(index, record)| validate(index, record, policy).map(|o| rank(o, policy)))
            .collect::<GeoNapResult<Vec<_>>>()?;

        info!(providers = providers.len(), "Provider catalog built");

        Ok(Self { providers })
    }

    /// Wrap already-ranked providers
    pub fn from_ranked(providers: Vec<RankedProvider>) -> Self {
        Self { providers }
    }

    /// Ranked providers in catalog order
    pub fn providers(&self) -> &[RankedProvider] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Sum of all offer capacities
    pub fn total_capacity(&self) -> u64 {
        self.providers.iter().map(|p| p.offer.capacity as u64).sum()
    }

    /// Distinct known accelerator models, sorted
    pub fn gpu_models(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.offer.gpu_model.clone())
            .filter(|m| !m.is_empty() && m != UNKNOWN_MODEL)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Accelerator models offered under one provider identifier
    pub fn models_at(&self, provider: &str) -> BTreeSet<String> {
        self.providers
            .iter()
            .filter(|p| p.id() == provider)
            .map(|p| p.offer.gpu_model.clone())
            .collect()
    }

    /// For each provider in the placement, whether it offers `model`
    pub fn availability(&self, placement: &Placement, model: &str) -> Vec<ModelAvailability> {
        placement
            .used_providers()
            .into_iter()
            .map(|used| {
                let available = self
                    .providers
                    .iter()
                    .any(|p| p.id() == used.id && p.offer.gpu_model.eq_ignore_ascii_case(model));
                ModelAvailability {
                    provider: used.id,
                    model: model.to_string(),
                    available,
                }
            })
            .collect()
    }
}

/// Whether a used provider offers a given accelerator model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAvailability {
    pub provider: String,
    pub model: String,
    pub available: bool,
}

fn validate(
    index: usize,
    record: &ProviderRecord,
    policy: &CatalogPolicy,
) -> GeoNapResult<ProviderOffer> {
    let provider = coerce::text(record.provider.as_deref())
        .ok_or_else(|| GeoNapError::missing_field(index, "provider"))?;
    let region = coerce::text(record.region.as_deref())
        .ok_or_else(|| GeoNapError::missing_field(index, "region"))?;
    let raw_price = record
        .price
        .as_ref()
        .filter(|v| !v.is_null())
        .ok_or_else(|| GeoNapError::missing_field(index, "price"))?;
    let price = coerce::number(raw_price).ok_or_else(|| {
        GeoNapError::Data(format!(
            "provider record {} has a non-numeric price: {}",
            index, raw_price
        ))
    })?;
    if price < 0.0 {
        return Err(GeoNapError::Data(format!(
            "provider record {} has a negative price: {}",
            index, price
        )));
    }

    let id = provider_id(&provider, &region);
    let capacity = policy.capacity.lookup(&id);

    Ok(ProviderOffer {
        rtt_ms: coerce::non_negative_or(record.rtt.as_ref(), policy.default_rtt_ms),
        bandwidth_gbps: coerce::positive_or(
            record.bandwidth.as_ref(),
            policy.default_bandwidth_gbps,
        ),
        gpu_model: coerce::text(record.gpu.as_deref()).unwrap_or_else(|| UNKNOWN_MODEL.to_string()),
        id,
        provider,
        region,
        price,
        capacity,
    })
}

/// Network penalty: `(1 + alpha * rtt) * (1 + beta / bandwidth)`
pub fn network_penalty(rtt_ms: f64, bandwidth_gbps: f64, policy: &CatalogPolicy) -> f64 {
    (1.0 + policy.alpha * rtt_ms) * (1.0 + policy.beta / bandwidth_gbps)
}

/// Attach the network-adjusted price to an offer
pub fn rank(offer: ProviderOffer, policy: &CatalogPolicy) -> RankedProvider {
    let penalty = network_penalty(offer.rtt_ms, offer.bandwidth_gbps, policy);
    let effective_price = offer.price * penalty;

    debug!(
        provider = %offer.id,
        price = offer.price,
        effective_price = effective_price,
        capacity = offer.capacity,
        "Ranked provider"
    );

    RankedProvider {
        offer,
        network_penalty: penalty,
        effective_price,
    }
}
