//! REST client for the search service
//!
//! Endpoint shape, keyed by an `api-key` header:
//!
//! - `GET/PUT/DELETE {endpoint}/indexes/{name}`
//! - `POST {endpoint}/indexes/{name}/docs/search` with `{ "search", "select" }`
//! - `PUT {endpoint}/datasources/{name}`
//! - `PUT {endpoint}/indexers/{name}` and `POST {endpoint}/indexers/{name}/run`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{
    product_index_schema, DataSourceRef, IndexSchema, ProductHit, SearchError, SearchPublisher,
    SearchResult,
};

/// Default request timeout against the search service.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Indexer batch size for the initial population run.
const INDEXER_BATCH_SIZE: u32 = 100;

/// Connection and naming settings for the search service.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Base URL, without trailing slash.
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub indexer_name: String,
    pub data_source_name: String,
    pub timeout_secs: u64,
}

impl SearchSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var("SEARCH_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("SEARCH_ENDPOINT not set"))?;
        let api_key = std::env::var("SEARCH_API_KEY")
            .map_err(|_| anyhow::anyhow!("SEARCH_API_KEY not set"))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            index_name: std::env::var("SEARCH_INDEX_NAME")
                .unwrap_or_else(|_| "product-sql-idx".to_string()),
            indexer_name: std::env::var("SEARCH_INDEXER_NAME")
                .unwrap_or_else(|_| "product-sql-idxr".to_string()),
            data_source_name: std::env::var("SEARCH_DATA_SOURCE_NAME")
                .unwrap_or_else(|_| "product-sql-ds".to_string()),
            timeout_secs: std::env::var("SEARCH_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
        })
    }
}

/// HTTP implementation of [`SearchPublisher`].
#[derive(Clone)]
pub struct HttpSearchPublisher {
    http: reqwest::Client,
    settings: SearchSettings,
}

impl HttpSearchPublisher {
    pub fn new(settings: SearchSettings) -> SearchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { http, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.endpoint, path)
    }

    fn keyed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("api-key", &self.settings.api_key)
    }

    async fn check(response: reqwest::Response) -> SearchResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(SearchError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Whether a resource exists; 404 maps to `false`.
    async fn exists(&self, path: &str) -> SearchResult<bool> {
        let response = self.keyed(self.http.get(self.url(path))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    async fn delete_if_exists(&self, path: &str) -> SearchResult<bool> {
        if !self.exists(path).await? {
            return Ok(false);
        }
        let response = self.keyed(self.http.delete(self.url(path))).send().await?;
        Self::check(response).await?;
        Ok(true)
    }

    /// Query the product index, returning matching documents.
    pub async fn query(&self, text: &str) -> SearchResult<Vec<ProductHit>> {
        let url = self.url(&format!(
            "/indexes/{}/docs/search",
            self.settings.index_name
        ));
        let select = product_index_schema(&self.settings.index_name)
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect::<Vec<_>>()
            .join(",");
        let body = json!({
            "search": text,
            "select": select,
        });

        debug!(index = %self.settings.index_name, query = %text, "Querying search index");

        let response = self.keyed(self.http.post(url)).json(&body).send().await?;
        let body: QueryResponse = Self::check(response).await?.json().await?;

        Ok(body.value)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    value: Vec<ProductHit>,
}

#[async_trait]
impl SearchPublisher for HttpSearchPublisher {
    async fn ensure_index_deleted(&self, name: &str) -> SearchResult<()> {
        if self.delete_if_exists(&format!("/indexes/{name}")).await? {
            info!(index = %name, "Removed old search index");
        }
        if self
            .delete_if_exists(&format!("/indexers/{}", self.settings.indexer_name))
            .await?
        {
            info!(indexer = %self.settings.indexer_name, "Removed old search indexer");
        }

        Ok(())
    }

    async fn ensure_index_and_indexer_created(
        &self,
        schema: &IndexSchema,
        data_source: &DataSourceRef,
    ) -> SearchResult<()> {
        if !self.exists(&format!("/indexes/{}", schema.name)).await? {
            info!(index = %schema.name, "Creating search index");
            let response = self
                .keyed(self.http.put(self.url(&format!("/indexes/{}", schema.name))))
                .json(schema)
                .send()
                .await?;
            Self::check(response).await?;
        }

        let response = self
            .keyed(
                self.http
                    .put(self.url(&format!("/datasources/{}", data_source.name))),
            )
            .json(data_source)
            .send()
            .await?;
        Self::check(response).await?;

        if !self
            .exists(&format!("/indexers/{}", self.settings.indexer_name))
            .await?
        {
            info!(indexer = %self.settings.indexer_name, "Creating search indexer");
            let body = json!({
                "name": self.settings.indexer_name,
                "data_source_name": data_source.name,
                "target_index_name": schema.name,
                "parameters": {
                    "batch_size": INDEXER_BATCH_SIZE,
                    "max_failed_items": 0,
                },
            });
            let response = self
                .keyed(
                    self.http
                        .put(self.url(&format!("/indexers/{}", self.settings.indexer_name))),
                )
                .json(&body)
                .send()
                .await?;
            Self::check(response).await?;
        }

        // Kick off the initial population; throttling here is not fatal.
        let run_url = self.url(&format!("/indexers/{}/run", self.settings.indexer_name));
        let response = self.keyed(self.http.post(run_url)).send().await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                indexer = %self.settings.indexer_name,
                "Indexer run throttled; will populate on its next schedule"
            );
            return Ok(());
        }
        Self::check(response).await?;

        Ok(())
    }
}
