use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::error::{InventoryError, StoreError};
use crate::database::UNDEFINED_TABLE;
use crate::models::branch::Branch;
use crate::models::inventory::{NewInventoryTransaction, TransactionType};

/// Arguments of the `adjust_inventory` database function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustInventoryCall {
    pub product_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub store_id: Uuid,
    pub quantity_change: i32,
    pub transaction_type: TransactionType,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

/// Remote operations used by the adjustment chain and the branch guard.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Trivial read against `inventory`. `Ok(false)` when the table does not exist.
    async fn inventory_table_exists(&self) -> Result<bool, StoreError>;

    async fn call_adjust_inventory(&self, call: &AdjustInventoryCall) -> Result<(), StoreError>;

    /// On-hand quantity of one cell; a missing row reads as zero.
    async fn current_quantity(&self, product_id: Uuid, branch_id: Option<Uuid>) -> Result<i32, StoreError>;

    async fn upsert_inventory(&self, product_id: Uuid, branch_id: Option<Uuid>, quantity: i32) -> Result<(), StoreError>;

    async fn insert_transaction(&self, tx: &NewInventoryTransaction) -> Result<(), StoreError>;

    async fn set_product_availability(&self, product_id: Uuid, is_available: bool) -> Result<(), StoreError>;

    async fn find_branch(&self, branch_id: Uuid) -> Result<Option<Branch>, StoreError>;

    async fn delete_branch(&self, branch_id: Uuid) -> Result<(), StoreError>;
}

pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn inventory_table_exists(&self) -> Result<bool, StoreError> {
        match sqlx::query("SELECT id FROM inventory LIMIT 1")
            .fetch_optional(&self.pool)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if crate::database::sqlstate(&e).as_deref() == Some(UNDEFINED_TABLE) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn call_adjust_inventory(&self, call: &AdjustInventoryCall) -> Result<(), StoreError> {
        sqlx::query("SELECT adjust_inventory($1, $2, $3, $4, $5, $6, $7)")
            .bind(call.product_id)
            .bind(call.branch_id)
            .bind(call.store_id)
            .bind(call.quantity_change)
            .bind(call.transaction_type.as_str())
            .bind(call.notes.as_deref())
            .bind(call.created_by)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn current_quantity(&self, product_id: Uuid, branch_id: Option<Uuid>) -> Result<i32, StoreError> {
        let qty = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM inventory
             WHERE product_id = $1 AND branch_id IS NOT DISTINCT FROM $2",
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(qty.unwrap_or(0))
    }

    async fn upsert_inventory(&self, product_id: Uuid, branch_id: Option<Uuid>, quantity: i32) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO inventory (product_id, branch_id, quantity, available_quantity, updated_at)
             VALUES ($1, $2, $3, $3, NOW())
             ON CONFLICT ON CONSTRAINT inventory_product_branch_key DO UPDATE
             SET quantity = EXCLUDED.quantity,
                 available_quantity = GREATEST(EXCLUDED.quantity - inventory.reserved_quantity, 0),
                 updated_at = NOW()",
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_transaction(&self, tx: &NewInventoryTransaction) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO inventory_transactions
             (product_id, branch_id, store_id, transaction_type,
              quantity_change, quantity_before, quantity_after, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(tx.product_id)
        .bind(tx.branch_id)
        .bind(tx.store_id)
        .bind(tx.transaction_type)
        .bind(tx.quantity_change)
        .bind(tx.quantity_before)
        .bind(tx.quantity_after)
        .bind(tx.notes.as_deref())
        .bind(tx.created_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_product_availability(&self, product_id: Uuid, is_available: bool) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE products SET is_available = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(is_available)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::new(format!("product {product_id} not found")));
        }
        Ok(())
    }

    async fn find_branch(&self, branch_id: Uuid) -> Result<Option<Branch>, StoreError> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT id, store_id, name_en, name_ar, address, is_main_branch, created_at
             FROM store_branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(branch)
    }

    async fn delete_branch(&self, branch_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM store_branches WHERE id = $1")
            .bind(branch_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Deletes a branch unless it is the store's main branch. The database trigger
/// rejects the same case; its message is matched on "main branch".
#[instrument(skip(store))]
pub async fn delete_branch(store: &dyn InventoryStore, branch_id: Uuid) -> Result<Branch, InventoryError> {
    let branch = store
        .find_branch(branch_id)
        .await?
        .ok_or(InventoryError::BranchNotFound(branch_id))?;

    if branch.is_main_branch {
        return Err(InventoryError::MainBranchDeletion);
    }

    match store.delete_branch(branch_id).await {
        Ok(()) => Ok(branch),
        Err(e) if e.mentions("main branch") => {
            warn!(%branch_id, error = %e, "Store refused branch deletion");
            Err(InventoryError::MainBranchDeletion)
        }
        Err(e) => Err(e.into()),
    }
}
