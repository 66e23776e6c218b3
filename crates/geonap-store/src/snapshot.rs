//! Validated catalog snapshots and the reloadable store

use chrono::{DateTime, Utc};
use geonap_core::{CatalogPolicy, GeoNapError, GeoNapResult, ProviderRecord};
use geonap_scheduler::ProviderCatalog;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::source::ProviderSource;

/// One validated load of the provider cache
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Name of the source the records came from
    pub source: String,
    /// When the snapshot was loaded
    pub loaded_at: DateTime<Utc>,
    /// Raw records as fetched
    pub records: Vec<ProviderRecord>,
    /// Ranked catalog built from `records`
    pub catalog: ProviderCatalog,
}

impl CatalogSnapshot {
    /// Validate records into a snapshot
    pub fn build(
        source: String,
        records: Vec<ProviderRecord>,
        policy: &CatalogPolicy,
    ) -> GeoNapResult<Self> {
        let catalog = ProviderCatalog::build(&records, policy)?;
        Ok(Self {
            source,
            loaded_at: Utc::now(),
            records,
            catalog,
        })
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            providers: self.catalog.len(),
            total_capacity: self.catalog.total_capacity(),
        }
    }
}

/// Snapshot summary for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub providers: usize,
    pub total_capacity: u64,
}

/// Holds the current catalog snapshot and swaps it on reload
pub struct ProviderStore {
    source: Arc<dyn ProviderSource>,
    policy: CatalogPolicy,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl ProviderStore {
    /// Create an empty store; call [`ProviderStore::reload`] to load
    pub fn new(source: Arc<dyn ProviderSource>, policy: CatalogPolicy) -> Self {
        Self {
            source,
            policy,
            current: RwLock::new(None),
        }
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Fetch and validate a fresh snapshot, then make it current
    ///
    /// A failed reload leaves the previous snapshot in place.
    pub async fn reload(&self) -> GeoNapResult<Arc<CatalogSnapshot>> {
        let name = self.source.name();
        let result = match self.source.fetch().await {
            Ok(records) => CatalogSnapshot::build(name.clone(), records, &self.policy),
            Err(e) => Err(e),
        };

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write().await = Some(snapshot.clone());
                info!(
                    source = %name,
                    providers = snapshot.catalog.len(),
                    "Catalog snapshot loaded"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(source = %name, error = %e, "Catalog reload failed");
                Err(e)
            }
        }
    }

    /// Current snapshot, if one has been loaded
    pub async fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current.read().await.clone()
    }

    /// Current snapshot or a catalog error when none is loaded
    pub async fn require(&self) -> GeoNapResult<Arc<CatalogSnapshot>> {
        self.current().await.ok_or_else(|| {
            GeoNapError::Catalog(format!("No provider catalog loaded from {}", self.source.name()))
        })
    }
}
