// src/dtos/product.rs
use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

/// Keeps an explicit JSON `null` as `Some(None)`; a missing field stays `None` via `default`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub store_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub sku: Option<String>,
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_available: bool,
    pub low_stock_threshold: Option<i32>,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name_en: Option<String>,
    pub name_ar: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub sku: Option<Option<String>>, // Some(Some(v)) set, Some(None) clear, None ignore
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub low_stock_threshold: Option<Option<i32>>,
    pub track_inventory: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductStatusRequest {
    pub is_available: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub store_id: Uuid,
    pub search: Option<String>,
    pub status: Option<String>, // "active", "trash"
    pub sort: Option<String>,   // "name", "price", "created_at"
    pub order: Option<String>,  // "asc", "desc"
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductQuery {
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub sku: Option<String>,
    pub price: f64,
    pub is_available: bool,
    pub low_stock_threshold: i32,
    pub track_inventory: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Convert from Model to Response DTO
impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        Self {
            id: product.id,
            store_id: product.store_id,
            name_en: product.name_en,
            name_ar: product.name_ar,
            sku: product.sku,
            price: product.price,
            is_available: product.is_available,
            low_stock_threshold: crate::inventory::effective_threshold(product.low_stock_threshold),
            track_inventory: product.track_inventory,
            deleted_at: product.deleted_at,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
