//! Blob store configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Custom endpoint URL, for MinIO or other S3-compatible stores.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Key prefix under which payloads are written, may be empty.
    pub prefix: String,
    /// Path-style addressing, required by MinIO.
    pub path_style: bool,
}

impl BlobConfig {
    /// Load from `S3_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: std::env::var("S3_BUCKET")
                .map_err(|_| anyhow!("S3_BUCKET not set"))?,
            access_key: std::env::var("S3_ACCESS_KEY")
                .map_err(|_| anyhow!("S3_ACCESS_KEY not set"))?,
            secret_key: std::env::var("S3_SECRET_KEY")
                .map_err(|_| anyhow!("S3_SECRET_KEY not set"))?,
            prefix: std::env::var("S3_PREFIX").unwrap_or_default(),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        })
    }

    /// Settings for a local MinIO instance, used in development.
    pub fn for_minio(endpoint: &str, bucket: &str, access_key: &str, secret_key: &str) -> Self {
        Self {
            endpoint: Some(endpoint.to_string()),
            region: "us-east-1".to_string(),
            bucket: bucket.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            prefix: String::new(),
            path_style: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(anyhow!("Blob bucket must not be empty"));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(anyhow!("Blob credentials must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minio_config_uses_path_style() {
        let config = BlobConfig::for_minio("http://localhost:9000", "imports", "minio", "minio123");
        assert!(config.path_style);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_bucket() {
        let mut config = BlobConfig::for_minio("http://localhost:9000", "b", "k", "s");
        config.bucket = String::new();
        assert!(config.validate().is_err());
    }
}
