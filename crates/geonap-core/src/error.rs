//! Error types for Geo-NAP

use thiserror::Error;

/// Main error type for Geo-NAP
#[derive(Error, Debug)]
pub enum GeoNapError {
    /// Malformed or incomplete provider record
    #[error("Data error: {0}")]
    Data(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider catalog unavailable
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GeoNapError {
    /// Build a data error for a record at `index` missing `field`
    pub fn missing_field(index: usize, field: &str) -> Self {
        GeoNapError::Data(format!(
            "provider record {} is missing required field '{}'",
            index, field
        ))
    }
}

/// Result type for Geo-NAP operations
pub type GeoNapResult<T> = Result<T, GeoNapError>;

impl From<serde_json::Error> for GeoNapError {
    fn from(err: serde_json::Error) -> Self {
        GeoNapError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for GeoNapError {
    fn from(err: toml::de::Error) -> Self {
        GeoNapError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoNapError::Config("invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid config");
    }

    #[test]
    fn test_missing_field_message() {
        let err = GeoNapError::missing_field(3, "price");
        assert_eq!(
            err.to_string(),
            "Data error: provider record 3 is missing required field 'price'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GeoNapError = io_err.into();
        assert!(matches!(err, GeoNapError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err: GeoNapError = json_err.into();
        assert!(matches!(err, GeoNapError::Serialization(_)));
    }
}
