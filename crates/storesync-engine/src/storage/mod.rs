//! S3-backed blob store
//!
//! The staging pipeline reads its source payloads from a blob container; the
//! engine only ever writes there. Payloads are the four entity JSON files
//! uploaded ahead of an orchestration session.

use anyhow::{anyhow, Context, Result};
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, primitives::ByteStream, Client};
use storesync_common::checksum::sha256_hex;
use tracing::{debug, info, instrument};

pub mod config;

pub use config::BlobConfig;

/// Blob store client bound to one bucket and key prefix.
#[derive(Clone)]
pub struct BlobStore {
    client: Client,
    bucket: String,
    prefix: String,
}

/// Outcome of one payload upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

impl BlobStore {
    pub async fn new(config: BlobConfig) -> Result<Self> {
        debug!("Initializing blob store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "storesync-blob",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Blob store client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
            prefix: config.prefix,
        })
    }

    /// Upload a JSON payload under the given file name.
    #[instrument(skip(self, payload))]
    pub async fn put_json(&self, file_name: &str, payload: Vec<u8>) -> Result<UploadResult> {
        let key = self.build_key(file_name);
        let checksum = sha256_hex(&payload);
        let size = payload.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(payload))
            .send()
            .await
            .context("Failed to upload payload to blob store")?;

        info!("Uploaded payload to s3://{}/{}", self.bucket, key);

        Ok(UploadResult { key, checksum, size })
    }

    /// Fetch a payload back, mainly for spot checks.
    #[instrument(skip(self))]
    pub async fn download(&self, file_name: &str) -> Result<Vec<u8>> {
        let key = self.build_key(file_name);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .context(format!("Failed to download blob: {key}"))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read blob response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(data)
    }

    #[instrument(skip(self))]
    pub async fn exists(&self, file_name: &str) -> Result<bool> {
        let key = self.build_key(file_name);

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("404") {
                    Ok(false)
                } else {
                    Err(anyhow!("Failed to check blob existence: {}", e))
                }
            },
        }
    }

    fn build_key(&self, file_name: &str) -> String {
        if self.prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), file_name)
        }
    }
}
