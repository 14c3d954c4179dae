use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inventory::{AdjustmentKind, AdjustmentOutcome, QuantityInput, StockStatus};
use crate::models::inventory::InventoryTransaction;

#[derive(Debug, Deserialize)]
pub struct InventoryOverviewQuery {
    pub store_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub stock_status: Option<String>, // "in_stock", "low_stock", "out_of_stock"
    pub search: Option<String>,
    pub sort: Option<String>,  // "name", "quantity", "available"
    pub order: Option<String>, // "asc", "desc"
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub store_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchStockItem {
    pub branch_id: Uuid,
    pub branch_name_en: String,
    pub branch_name_ar: String,
    pub is_main_branch: bool,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    /// False when the branch has no inventory row and the numbers are a zero placeholder.
    pub has_record: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStockResponse {
    pub product_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub sku: Option<String>,
    pub is_available: bool,
    pub track_inventory: bool,
    pub low_stock_threshold: i32,
    pub stock_status: StockStatus,
    pub total_quantity: i64,
    pub total_reserved: i64,
    pub total_available: i64,
    pub branches: Vec<BranchStockItem>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustInventoryRequest {
    pub product_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub adjustment_type: AdjustmentKind,
    pub quantity: QuantityInput,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustInventoryResponse {
    pub outcome: AdjustmentOutcome,
    pub stock: ProductStockResponse,
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub product_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub limit: Option<i64>,
}

pub type TransactionResponse = InventoryTransaction;
