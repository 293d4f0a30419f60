//! Sample source records
//!
//! Deterministic payloads for the four entity kinds, shaped the way the
//! staging pipeline expects them. Key columns are nullable on the wire: a
//! `null` key marks a brand-new record that production assigns an identity
//! for, while a concrete key updates the matching production row.

use serde::{Deserialize, Serialize};
use storesync_engine::entity::EntityKind;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category_id: Option<i32>,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: Option<i32>,
    pub product_name: String,
    pub category_id: i32,
    /// Decimal carried as a string to avoid float rounding on the wire.
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub date_added: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: Option<i32>,
    pub order_date: String,
    pub customer_name: String,
}

/// Join record; both halves of the composite key are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProductRecord {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

pub fn sample_categories() -> Vec<CategoryRecord> {
    vec![
        CategoryRecord {
            category_id: None,
            category_name: "Beverages".to_string(),
        },
        CategoryRecord {
            category_id: None,
            category_name: "Snacks".to_string(),
        },
        CategoryRecord {
            category_id: Some(1),
            category_name: "Pantry Staples".to_string(),
        },
    ]
}

pub fn sample_products() -> Vec<ProductRecord> {
    vec![
        ProductRecord {
            product_id: None,
            product_name: "Cold Brew Coffee".to_string(),
            category_id: 1,
            price: "4.99".to_string(),
            description: "Slow-steeped single origin cold brew".to_string(),
            image_url: "https://images.example.com/cold-brew.jpg".to_string(),
            date_added: "2024-01-15T09:30:00Z".to_string(),
        },
        ProductRecord {
            product_id: None,
            product_name: "Sparkling Water 12-pack".to_string(),
            category_id: 1,
            price: "6.49".to_string(),
            description: "Unsweetened lime sparkling water".to_string(),
            image_url: "https://images.example.com/sparkling-water.jpg".to_string(),
            date_added: "2024-01-15T09:30:00Z".to_string(),
        },
        ProductRecord {
            product_id: Some(1),
            product_name: "Sea Salt Crackers".to_string(),
            category_id: 2,
            price: "3.29".to_string(),
            description: "Stone-ground wheat crackers".to_string(),
            image_url: "https://images.example.com/crackers.jpg".to_string(),
            date_added: "2024-02-01T12:00:00Z".to_string(),
        },
    ]
}

pub fn sample_orders() -> Vec<OrderRecord> {
    vec![
        OrderRecord {
            order_id: None,
            order_date: "2024-03-10T14:05:00Z".to_string(),
            customer_name: "Avery Chen".to_string(),
        },
        OrderRecord {
            order_id: Some(1),
            order_date: "2024-03-08T10:42:00Z".to_string(),
            customer_name: "Jordan Ellis".to_string(),
        },
    ]
}

pub fn sample_order_products() -> Vec<OrderProductRecord> {
    vec![
        OrderProductRecord {
            order_id: 1,
            product_id: 1,
            quantity: 2,
        },
        OrderProductRecord {
            order_id: 1,
            product_id: 2,
            quantity: 1,
        },
    ]
}

/// Serialize the sample payload for one entity kind.
pub fn payload_for(kind: EntityKind) -> Result<Vec<u8>> {
    let bytes = match kind {
        EntityKind::Category => serde_json::to_vec_pretty(&sample_categories())?,
        EntityKind::Product => serde_json::to_vec_pretty(&sample_products())?,
        EntityKind::Order => serde_json::to_vec_pretty(&sample_orders())?,
        EntityKind::OrderProduct => serde_json::to_vec_pretty(&sample_order_products())?,
    };
    Ok(bytes)
}
