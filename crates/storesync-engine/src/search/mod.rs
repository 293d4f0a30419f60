//! Product search publishing
//!
//! After all four entity kinds have synced, the product search surface is
//! republished from the now-current production table: drop the old index,
//! then recreate the index and its indexer against the production data
//! source. The REST implementation lives in [`http`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;

pub use http::{HttpSearchPublisher, SearchSettings};

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Failures talking to the search service
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// One field of a search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
}

impl IndexField {
    fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
        }
    }

    fn key(mut self) -> Self {
        self.key = true;
        self
    }

    fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

/// Schema for one search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSchema {
    pub name: String,
    pub fields: Vec<IndexField>,
}

/// Reference to the relational table an indexer reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceRef {
    pub name: String,
    pub table: String,
}

/// One product document returned by a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductHit {
    pub product_id: String,
    pub product_name: String,
    pub category_id: i32,
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub date_added: String,
}

/// The product search index schema, mirroring the production products table.
pub fn product_index_schema(index_name: &str) -> IndexSchema {
    IndexSchema {
        name: index_name.to_string(),
        fields: vec![
            IndexField::new("product_id", "String").key().filterable(),
            IndexField::new("product_name", "String").searchable().sortable(),
            IndexField::new("category_id", "Int32").filterable(),
            IndexField::new("price", "String").searchable().sortable(),
            IndexField::new("description", "String").searchable(),
            IndexField::new("image_url", "String").searchable(),
            IndexField::new("date_added", "DateTime").filterable(),
        ],
    }
}

/// External search publisher.
#[async_trait]
pub trait SearchPublisher: Send + Sync {
    /// Remove the index (and its indexer) if present; absent is success.
    async fn ensure_index_deleted(&self, name: &str) -> SearchResult<()>;

    /// Create the index, its data source, and its indexer, then trigger an
    /// initial indexer run.
    async fn ensure_index_and_indexer_created(
        &self,
        schema: &IndexSchema,
        data_source: &DataSourceRef,
    ) -> SearchResult<()>;
}
