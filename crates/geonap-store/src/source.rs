//! Provider record sources

use async_trait::async_trait;
use geonap_core::{GeoNapError, GeoNapResult, ProviderRecord};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of raw provider records
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Fetch every record currently offered by the source
    async fn fetch(&self) -> GeoNapResult<Vec<ProviderRecord>>;

    /// Source name for logs and status
    fn name(&self) -> String;
}

/// Provider cache stored as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProviderSource for JsonFileSource {
    async fn fetch(&self) -> GeoNapResult<Vec<ProviderRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            GeoNapError::Catalog(format!(
                "Failed to read provider cache {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let records = parse_records(&content)?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "Loaded provider cache"
        );
        Ok(records)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed set of records held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<ProviderRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<ProviderRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ProviderSource for MemorySource {
    async fn fetch(&self) -> GeoNapResult<Vec<ProviderRecord>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

/// Parse a provider cache document
///
/// The document must be a JSON array of objects. Anything else is an error,
/// never an empty list.
pub fn parse_records(content: &str) -> GeoNapResult<Vec<ProviderRecord>> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| GeoNapError::Catalog(format!("Provider cache is not valid JSON: {}", e)))?;

    let Value::Array(items) = document else {
        return Err(GeoNapError::Catalog(
            "Provider cache must be a JSON array of provider records".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(GeoNapError::Data(format!(
                    "provider record {} is not an object",
                    index
                )));
            }
            let record: ProviderRecord = serde_json::from_value(item).map_err(|e| {
                GeoNapError::Data(format!("provider record {} is malformed: {}", index, e))
            })?;
            debug!(index = index, provider = ?record.provider, "Parsed provider record");
            Ok(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cache_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let file = cache_file(
            r#"[
                {"provider": "aws", "region": "ap-south-1", "price": 3.2, "rtt": 8, "bandwidth": 25, "gpu": "H100"},
                {"provider": "vast", "region": "global", "price": "0.45"}
            ]"#,
        );
        let source = JsonFileSource::new(file.path());
        let records = source.fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].provider.as_deref(), Some("aws"));
        assert_eq!(records[0].gpu.as_deref(), Some("H100"));
        assert!(records[1].rtt.is_none());
        assert_eq!(source.name(), file.path().display().to_string());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("providers.json"));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, GeoNapError::Catalog(_)));
    }

    #[test]
    fn test_invalid_documents_rejected() {
        assert!(matches!(parse_records("not json"), Err(GeoNapError::Catalog(_))));
        assert!(matches!(
            parse_records(r#"{"provider": "aws"}"#),
            Err(GeoNapError::Catalog(_))
        ));
        assert!(matches!(parse_records("[1, 2]"), Err(GeoNapError::Data(_))));
    }

    #[test]
    fn test_empty_array_is_empty_catalog() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new(vec![ProviderRecord::new("aws", "x", 1.0)]);
        assert_eq!(source.fetch().await.unwrap().len(), 1);
        assert_eq!(source.name(), "memory");
    }
}
