use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::access::authorize_store;
use crate::dtos::inventory::{
    AdjustInventoryRequest, AdjustInventoryResponse, BranchStockItem, InventoryOverviewQuery,
    LowStockQuery, ProductStockResponse, TransactionQuery, TransactionResponse,
};
use crate::error::AppError;
use crate::handlers::branch::{fetch_branch, load_branches};
use crate::handlers::product::{fetch_product, fetch_store_product};
use crate::inventory::{
    adjust, aggregate_catalog, aggregate_product, classify_stock, effective_threshold,
    AdjustmentRequest, ProductStock, StockSnapshot, StockStatus,
};
use crate::middleware::auth::AuthContext;
use crate::models::branch::Branch;
use crate::models::inventory::{InventoryRecord, InventoryTransaction};
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::state::AppState;

const INVENTORY_COLUMNS: &str =
    "i.id, i.product_id, i.branch_id, i.quantity, i.reserved_quantity, i.available_quantity, i.updated_at";

const MAX_TRANSACTIONS: i64 = 200;

async fn load_store_rows(pool: &PgPool, store_id: Uuid) -> Result<Vec<InventoryRecord>, AppError> {
    let rows = sqlx::query_as::<_, InventoryRecord>(&format!(
        "SELECT {INVENTORY_COLUMNS}
         FROM inventory i
         JOIN products p ON p.id = i.product_id
         WHERE p.store_id = $1 AND p.deleted_at IS NULL"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn load_product_rows(pool: &PgPool, product_id: Uuid) -> Result<Vec<InventoryRecord>, AppError> {
    let rows = sqlx::query_as::<_, InventoryRecord>(&format!(
        "SELECT {INVENTORY_COLUMNS} FROM inventory i WHERE i.product_id = $1"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn load_active_products(pool: &PgPool, store_id: Uuid) -> Result<Vec<Product>, AppError> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE store_id = $1 AND deleted_at IS NULL
         ORDER BY name_en"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// `stock.items` is aligned with `branches` by construction.
fn stock_response(
    product: &Product,
    stock: ProductStock,
    branches: &[Branch],
    threshold: i32,
    status: StockStatus,
) -> ProductStockResponse {
    let items = stock
        .items
        .iter()
        .zip(branches)
        .map(|(item, branch)| BranchStockItem {
            branch_id: branch.id,
            branch_name_en: branch.name_en.clone(),
            branch_name_ar: branch.name_ar.clone(),
            is_main_branch: branch.is_main_branch,
            quantity: item.quantity,
            reserved_quantity: item.reserved_quantity,
            available_quantity: item.available_quantity,
            has_record: !item.is_placeholder(),
        })
        .collect();

    ProductStockResponse {
        product_id: product.id,
        name_en: product.name_en.clone(),
        name_ar: product.name_ar.clone(),
        sku: product.sku.clone(),
        is_available: product.is_available,
        track_inventory: product.track_inventory,
        low_stock_threshold: threshold,
        stock_status: status,
        total_quantity: stock.total_quantity,
        total_reserved: stock.total_reserved,
        total_available: stock.total_available,
        branches: items,
    }
}

fn product_stock(product: &Product, rows: &[InventoryRecord], branches: &[Branch]) -> ProductStockResponse {
    let stock = aggregate_product(product.id, rows, branches);
    let threshold = effective_threshold(product.low_stock_threshold);
    let status = classify_stock(stock.total_available, threshold);
    stock_response(product, stock, branches, threshold, status)
}

/// Overview rows for a store, optionally narrowed to one branch. When narrowed, totals
/// and classification reflect that branch only.
async fn store_overview(
    pool: &PgPool,
    store_id: Uuid,
    branch_id: Option<Uuid>,
) -> Result<Vec<ProductStockResponse>, AppError> {
    let mut branches = load_branches(pool, store_id).await?;
    let mut rows = load_store_rows(pool, store_id).await?;

    if let Some(bid) = branch_id {
        branches.retain(|b| b.id == bid);
        if branches.is_empty() {
            return Err(AppError::not_found("Branch not found in this store"));
        }
        rows.retain(|r| r.branch_id == Some(bid));
    }

    let products = load_active_products(pool, store_id).await?;

    Ok(aggregate_catalog(&products, &rows, &branches)
        .into_iter()
        .map(|c| stock_response(c.product, c.stock, &branches, c.threshold, c.status))
        .collect())
}

fn filter_and_sort(
    mut items: Vec<ProductStockResponse>,
    status: Option<StockStatus>,
    search: Option<&str>,
    sort: Option<&str>,
    order: Option<&str>,
) -> Result<Vec<ProductStockResponse>, AppError> {
    if let Some(status) = status {
        items.retain(|i| i.stock_status == status);
    }

    if let Some(needle) = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) {
        items.retain(|i| {
            i.name_en.to_lowercase().contains(&needle)
                || i.name_ar.to_lowercase().contains(&needle)
                || i.sku.as_deref().is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    let descending = match order.unwrap_or("asc") {
        "asc" => false,
        "desc" => true,
        _ => return Err(AppError::validation("Invalid order. Use: asc or desc")),
    };

    match sort.unwrap_or("name") {
        "name" => items.sort_by(|a, b| a.name_en.to_lowercase().cmp(&b.name_en.to_lowercase())),
        "quantity" => items.sort_by_key(|i| i.total_quantity),
        "available" => items.sort_by_key(|i| i.total_available),
        _ => return Err(AppError::validation("Invalid sort. Use: name, quantity, or available")),
    }
    if descending {
        items.reverse();
    }

    Ok(items)
}

// GET /inventory - Stock overview of a store
#[instrument(skip(state, auth))]
pub async fn get_inventory_overview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<InventoryOverviewQuery>,
) -> Result<Json<Vec<ProductStockResponse>>, AppError> {
    authorize_store(&state.db_pool, &auth, params.store_id).await?;

    let status = params
        .stock_status
        .as_deref()
        .map(str::parse::<StockStatus>)
        .transpose()
        .map_err(AppError::validation)?;

    let items = store_overview(&state.db_pool, params.store_id, params.branch_id).await?;

    Ok(Json(filter_and_sort(
        items,
        status,
        params.search.as_deref(),
        params.sort.as_deref(),
        params.order.as_deref(),
    )?))
}

// GET /inventory/low-stock - Products that are low or out of stock, emptiest first
#[instrument(skip(state, auth))]
pub async fn get_low_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<LowStockQuery>,
) -> Result<Json<Vec<ProductStockResponse>>, AppError> {
    authorize_store(&state.db_pool, &auth, params.store_id).await?;
    let mut items = store_overview(&state.db_pool, params.store_id, None).await?;
    items.retain(|i| i.track_inventory && i.stock_status.needs_attention());
    items.sort_by_key(|i| i.total_available);
    Ok(Json(items))
}

// GET /inventory/products/:id - Per-branch stock of one product
#[instrument(skip(state, auth))]
pub async fn get_product_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductStockResponse>, AppError> {
    let (product, _) = fetch_store_product(&state, &auth, product_id).await?;
    let branches = load_branches(&state.db_pool, product.store_id).await?;
    let rows = load_product_rows(&state.db_pool, product_id).await?;

    Ok(Json(product_stock(&product, &rows, &branches)))
}

// POST /inventory/adjust - Add, remove or set stock for one branch
#[instrument(skip(state, auth, req))]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AdjustInventoryRequest>,
) -> Result<Json<AdjustInventoryResponse>, AppError> {
    let (product, _) = fetch_store_product(&state, &auth, req.product_id).await?;
    if product.is_trashed() {
        return Err(AppError::conflict("Cannot adjust stock of a product in trash"));
    }
    if !product.track_inventory {
        return Err(AppError::validation("Inventory tracking is disabled for this product"));
    }

    if let Some(branch_id) = req.branch_id {
        let branch = fetch_branch(&state.db_pool, branch_id).await?;
        if branch.store_id != product.store_id {
            return Err(AppError::validation("Branch does not belong to the product's store"));
        }
    }

    // Last known stock of the selected cell; may be stale against other sessions.
    let rows = load_product_rows(&state.db_pool, product.id).await?;
    let snapshot = StockSnapshot::for_branch(&rows, product.id, req.branch_id);

    let request = AdjustmentRequest {
        product_id: product.id,
        store_id: product.store_id,
        branch_id: req.branch_id,
        kind: req.adjustment_type,
        quantity: req.quantity,
        notes: req.notes,
        actor: Some(auth.user_id),
    };
    let outcome = adjust(state.store.as_ref(), &request, snapshot).await?;

    info!(
        strategy = outcome.strategy.as_str(),
        change = outcome.quantity_change,
        user = %auth.username,
        "Inventory adjusted"
    );

    // Reconcile from the store rather than trusting the local arithmetic.
    let product = fetch_product(&state, product.id).await?;
    let branches = load_branches(&state.db_pool, product.store_id).await?;
    let rows = load_product_rows(&state.db_pool, product.id).await?;

    Ok(Json(AdjustInventoryResponse {
        outcome,
        stock: product_stock(&product, &rows, &branches),
    }))
}

// GET /inventory/transactions - Adjustment log of a product
#[instrument(skip(state, auth))]
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    fetch_store_product(&state, &auth, params.product_id).await?;
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_TRANSACTIONS);

    let transactions = sqlx::query_as::<_, InventoryTransaction>(
        "SELECT id, product_id, branch_id, store_id, transaction_type,
                quantity_change, quantity_before, quantity_after, notes, created_by, created_at
         FROM inventory_transactions
         WHERE product_id = $1
           AND ($2::UUID IS NULL OR branch_id = $2)
         ORDER BY created_at DESC, id
         LIMIT $3",
    )
    .bind(params.product_id)
    .bind(params.branch_id)
    .bind(limit)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::aggregate::tests::{branch, product, record};

    fn overview(products: &[Product], rows: &[InventoryRecord], branches: &[Branch]) -> Vec<ProductStockResponse> {
        products.iter().map(|p| product_stock(p, rows, branches)).collect()
    }

    #[test]
    fn stock_response_names_every_branch() {
        let p = product(Some(10));
        let main = branch("Main", true);
        let east = branch("East", false);
        let rows = vec![record(p.id, Some(main.id), 5, 0)];

        let resp = product_stock(&p, &rows, &[main.clone(), east.clone()]);

        assert_eq!(resp.stock_status, StockStatus::LowStock);
        assert_eq!(resp.total_available, 5);
        assert_eq!(resp.branches.len(), 2);
        assert_eq!(resp.branches[1].branch_name_en, "East");
        assert!(!resp.branches[1].has_record);
        assert_eq!(resp.branches[1].quantity, 0);
        assert!(resp.branches[0].has_record);
    }

    #[test]
    fn filters_by_status_and_sorts_by_available() {
        let b = branch("Main", true);
        let mut a = product(Some(2));
        a.name_en = "Alpha".into();
        let mut z = product(Some(2));
        z.name_en = "Zulu".into();
        let mut empty = product(None);
        empty.name_en = "Empty".into();
        let rows = vec![record(a.id, Some(b.id), 30, 0), record(z.id, Some(b.id), 8, 0)];
        let items = overview(&[a, z, empty], &rows, &[b]);

        let sorted = filter_and_sort(items.clone(), None, None, Some("available"), Some("desc")).unwrap();
        let names: Vec<_> = sorted.iter().map(|i| i.name_en.as_str()).collect();
        assert_eq!(names, ["Alpha", "Zulu", "Empty"]);

        let out = filter_and_sort(items, Some(StockStatus::OutOfStock), None, None, None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name_en, "Empty");
    }

    #[test]
    fn search_matches_sku_case_insensitively() {
        let b = branch("Main", true);
        let p = product(None);
        let items = overview(&[p], &[], &[b]);

        assert_eq!(filter_and_sort(items.clone(), None, Some("cb-"), None, None).unwrap().len(), 1);
        assert!(filter_and_sort(items, None, Some("tea"), None, None).unwrap().is_empty());
    }

    #[test]
    fn unknown_sort_is_rejected() {
        assert!(filter_and_sort(vec![], None, None, Some("price"), None).is_err());
        assert!(filter_and_sort(vec![], None, None, None, Some("up")).is_err());
    }
}
