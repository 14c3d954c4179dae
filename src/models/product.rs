use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub sku: Option<String>,
    pub price: f64,
    pub is_available: bool,
    pub low_stock_threshold: Option<i32>,
    pub track_inventory: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Column list shared by every product query; price is NUMERIC in the table.
pub const PRODUCT_COLUMNS: &str = "id, store_id, name_en, name_ar, sku,
    price::FLOAT8 AS price, is_available, low_stock_threshold, track_inventory,
    deleted_at, created_at, updated_at";
