//! Entity kinds and their static descriptors
//!
//! Each record set moved by the pipeline is described by exactly one
//! [`EntityDescriptor`]: staging table, production table, blob file name, job
//! name, key column(s) and column lists. The descriptor table is the single
//! source of truth for the pipeline builder and the merge engine, so table
//! names and column lists can never drift apart between the two.

use serde::{Deserialize, Serialize};

/// The four fixed record types processed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Category,
    Product,
    Order,
    OrderProduct,
}

impl EntityKind {
    /// All kinds in dependency order.
    ///
    /// OrderProduct rows reference both order and product keys, so that kind
    /// must always be processed last. This is a hard ordering invariant.
    pub const IN_DEPENDENCY_ORDER: [EntityKind; 4] = [
        EntityKind::Category,
        EntityKind::Product,
        EntityKind::Order,
        EntityKind::OrderProduct,
    ];

    /// Stable lowercase identifier used in logs and job names.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Product => "product",
            EntityKind::Order => "order",
            EntityKind::OrderProduct => "order-product",
        }
    }

    /// The static descriptor for this kind.
    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityKind::Category => &CATEGORY,
            EntityKind::Product => &PRODUCT,
            EntityKind::Order => &ORDER,
            EntityKind::OrderProduct => &ORDER_PRODUCT,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire type of a source column, validated downstream by the pipeline runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int32,
    Decimal,
    DateTime,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Int32 => "Int32",
            ColumnType::Decimal => "Decimal",
            ColumnType::DateTime => "DateTime",
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty }
}

/// Static description of one entity kind.
///
/// `source_columns` is the exact structure of the blob payload handed to the
/// pipeline runner. `data_columns` are the non-key columns reconciled by the
/// merge engine; for the composite-key kind the two lists differ because the
/// key columns are themselves part of the payload.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub staging_table: &'static str,
    pub production_table: &'static str,
    pub blob_file: &'static str,
    pub job_name: &'static str,
    /// Primary key column(s); composite for OrderProduct.
    pub key_columns: &'static [&'static str],
    /// Non-key columns carried through the merge.
    pub data_columns: &'static [Column],
    /// Exact column structure of the blob payload.
    pub source_columns: &'static [Column],
    /// Kinds whose production data must be committed before this one merges.
    pub dependencies: &'static [EntityKind],
}

static CATEGORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Category,
    staging_table: "categories_staging",
    production_table: "categories",
    blob_file: "categories.json",
    job_name: "category-pipeline",
    key_columns: &["category_id"],
    data_columns: &[col("category_name", ColumnType::String)],
    source_columns: &[col("category_name", ColumnType::String)],
    dependencies: &[],
};

static PRODUCT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Product,
    staging_table: "products_staging",
    production_table: "products",
    blob_file: "products.json",
    job_name: "product-pipeline",
    key_columns: &["product_id"],
    data_columns: &[
        col("product_name", ColumnType::String),
        col("category_id", ColumnType::Int32),
        col("price", ColumnType::Decimal),
        col("description", ColumnType::String),
        col("image_url", ColumnType::String),
        col("date_added", ColumnType::DateTime),
    ],
    source_columns: &[
        col("product_name", ColumnType::String),
        col("category_id", ColumnType::Int32),
        col("price", ColumnType::Decimal),
        col("description", ColumnType::String),
        col("image_url", ColumnType::String),
        col("date_added", ColumnType::DateTime),
    ],
    dependencies: &[EntityKind::Category],
};

static ORDER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Order,
    staging_table: "orders_staging",
    production_table: "orders",
    blob_file: "orders.json",
    job_name: "order-pipeline",
    key_columns: &["order_id"],
    data_columns: &[
        col("order_date", ColumnType::DateTime),
        col("customer_name", ColumnType::String),
    ],
    source_columns: &[
        col("order_date", ColumnType::DateTime),
        col("customer_name", ColumnType::String),
    ],
    dependencies: &[],
};

static ORDER_PRODUCT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::OrderProduct,
    staging_table: "order_products_staging",
    production_table: "order_products",
    blob_file: "orderproducts.json",
    job_name: "order-product-pipeline",
    key_columns: &["order_id", "product_id"],
    data_columns: &[col("quantity", ColumnType::Int32)],
    source_columns: &[
        col("order_id", ColumnType::Int32),
        col("product_id", ColumnType::Int32),
        col("quantity", ColumnType::Int32),
    ],
    dependencies: &[EntityKind::Product, EntityKind::Order],
};
