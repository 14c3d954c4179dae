use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryRecord {
    pub id: Option<Uuid>,
    pub product_id: Uuid,
    /// `None` is the unscoped row of a store without branch-level tracking.
    pub branch_id: Option<Uuid>,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    /// Zero-stock stand-in for a branch that has no row yet.
    pub fn placeholder(product_id: Uuid, branch_id: Uuid) -> Self {
        Self {
            id: None,
            product_id,
            branch_id: Some(branch_id),
            quantity: 0,
            reserved_quantity: 0,
            available_quantity: 0,
            updated_at: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inventory_transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Sale,
    Adjustment,
    Transfer,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Sale => "sale",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub store_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_change: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Log row written alongside a manual stock change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryTransaction {
    pub product_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub store_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_change: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}
