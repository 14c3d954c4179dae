// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{Error as SqlxError, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::auth::access::{authorize_store, StoreAccess};
use crate::database::{sqlstate, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::dtos::product::{
    CreateProductRequest, DeleteProductQuery, ProductListQuery, ProductResponse,
    UpdateProductRequest, UpdateProductStatusRequest,
};
use crate::middleware::auth::AuthContext;
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::state::AppState;
use crate::error::AppError;
use tracing::{error, info, instrument};

fn map_write_error(err: SqlxError) -> AppError {
    match sqlstate(&err).as_deref() {
        Some(UNIQUE_VIOLATION) => AppError::conflict("Product SKU already exists in this store"),
        Some(FOREIGN_KEY_VIOLATION) => AppError::validation("Invalid store_id"),
        _ => err.into(),
    }
}

fn validate_fields(
    name_en: Option<&str>,
    name_ar: Option<&str>,
    price: Option<f64>,
    threshold: Option<i32>,
) -> Result<(), AppError> {
    if name_en.is_some_and(|n| n.trim().is_empty()) || name_ar.is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Product name is required in both languages"));
    }
    if price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return Err(AppError::validation("Price cannot be negative"));
    }
    if threshold.is_some_and(|t| t < 0) {
        return Err(AppError::validation("Low stock threshold cannot be negative"));
    }
    Ok(())
}

/// ORDER BY clause for the list endpoint; only whitelisted columns reach SQL.
fn order_clause(sort: Option<&str>, order: Option<&str>) -> Result<String, AppError> {
    let column = match sort.unwrap_or("created_at") {
        "name" => "name_en",
        "price" => "price",
        "created_at" => "created_at",
        _ => return Err(AppError::validation("Invalid sort. Use: name, price, or created_at")),
    };
    let direction = match order.unwrap_or("desc") {
        "asc" => "ASC",
        "desc" => "DESC",
        _ => return Err(AppError::validation("Invalid order. Use: asc or desc")),
    };
    Ok(format!(" ORDER BY {column} {direction}, id"))
}

pub(crate) async fn fetch_product(state: &AppState, id: Uuid) -> Result<Product, AppError> {
    sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))
}

/// Loads a product and checks the caller may act on its store.
pub(crate) async fn fetch_store_product(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> Result<(Product, StoreAccess), AppError> {
    let product = fetch_product(state, id).await?;
    let access = authorize_store(&state.db_pool, auth, product.store_id).await?;
    Ok((product, access))
}

// GET /products - List products of a store
#[instrument(skip(state, auth))]
pub async fn get_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    authorize_store(&state.db_pool, &auth, params.store_id).await?;

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = "));
    query.push_bind(params.store_id);

    match params.status.as_deref().unwrap_or("active") {
        "active" => query.push(" AND deleted_at IS NULL"),
        "trash" => query.push(" AND deleted_at IS NOT NULL"),
        _ => return Err(AppError::validation("Invalid status. Use: active or trash")),
    };

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query
            .push(" AND (name_en ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name_ar ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query.push(order_clause(params.sort.as_deref(), params.order.as_deref())?);

    match query.build_query_as::<Product>().fetch_all(&state.db_pool).await {
        Ok(products) => {
            let response = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/:id - Get single product
#[instrument(skip(state, auth))]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProductResponse>, AppError> {
    let (product, _) = fetch_store_product(&state, &auth, id).await?;
    Ok(Json(ProductResponse::from(product)))
}

// POST /products - Create new product
#[instrument(skip(state, auth, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    authorize_store(&state.db_pool, &auth, payload.store_id).await?;
    validate_fields(
        Some(&payload.name_en),
        Some(&payload.name_ar),
        Some(payload.price),
        payload.low_stock_threshold,
    )?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products
         (store_id, name_en, name_ar, sku, price, is_available, low_stock_threshold, track_inventory)
         VALUES ($1, $2, $3, $4, $5::FLOAT8, $6, $7, $8)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.store_id)
    .bind(payload.name_en.trim())
    .bind(payload.name_ar.trim())
    .bind(payload.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(payload.price)
    .bind(payload.is_available)
    .bind(payload.low_stock_threshold)
    .bind(payload.track_inventory)
    .fetch_one(&state.db_pool)
    .await
    .map_err(map_write_error)?;

    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// PUT /products/:id - Update product. `sku` and `low_stock_threshold` may be sent as null to clear them.
#[instrument(skip(state, auth, payload))]
pub async fn update_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    validate_fields(
        payload.name_en.as_deref(),
        payload.name_ar.as_deref(),
        payload.price,
        payload.low_stock_threshold.flatten(),
    )?;
    fetch_store_product(&state, &auth, id).await?;

    let sku = payload
        .sku
        .map(|sku| sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
         name_en = COALESCE($1, name_en),
         name_ar = COALESCE($2, name_ar),
         sku = CASE WHEN $3 THEN $4 ELSE sku END,
         price = COALESCE($5::FLOAT8, price),
         low_stock_threshold = CASE WHEN $6 THEN $7 ELSE low_stock_threshold END,
         track_inventory = COALESCE($8, track_inventory),
         updated_at = NOW()
         WHERE id = $9 AND deleted_at IS NULL
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.name_en.as_deref().map(str::trim))
    .bind(payload.name_ar.as_deref().map(str::trim))
    .bind(sku.is_some())
    .bind(sku.flatten())
    .bind(payload.price)
    .bind(payload.low_stock_threshold.is_some())
    .bind(payload.low_stock_threshold.flatten())
    .bind(payload.track_inventory)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(map_write_error)?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// PUT /products/:id/status - Toggle availability
#[instrument(skip(state, auth))]
pub async fn update_product_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProductStatusRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    fetch_store_product(&state, &auth, id).await?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET is_available = $1, updated_at = NOW()
         WHERE id = $2 AND deleted_at IS NULL
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.is_available)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// DELETE /products/:id - Move to trash, or purge with ?permanent=true
#[instrument(skip(state, auth))]
pub async fn delete_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<DeleteProductQuery>,
) -> Result<StatusCode, AppError> {
    let (product, access) = fetch_store_product(&state, &auth, id).await?;

    if params.permanent {
        access.require_owner("permanently delete products")?;
        if !product.is_trashed() {
            return Err(AppError::conflict("Move the product to trash before deleting it permanently"));
        }
        // inventory and transaction rows cascade
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&state.db_pool)
            .await?;
        info!(product_id = %id, "Product permanently deleted");
        return Ok(StatusCode::NO_CONTENT);
    }

    if product.is_trashed() {
        return Err(AppError::conflict("Product is already in trash"));
    }

    sqlx::query("UPDATE products SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    info!(product_id = %id, "Product moved to trash");
    Ok(StatusCode::NO_CONTENT)
}

// POST /products/:id/restore - Restore from trash
#[instrument(skip(state, auth))]
pub async fn restore_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProductResponse>, AppError> {
    fetch_store_product(&state, &auth, id).await?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET deleted_at = NULL, updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NOT NULL
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found in trash"))?;

    Ok(Json(ProductResponse::from(product)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_defaults_to_newest_first() {
        assert_eq!(order_clause(None, None).unwrap(), " ORDER BY created_at DESC, id");
        assert_eq!(order_clause(Some("name"), Some("asc")).unwrap(), " ORDER BY name_en ASC, id");
    }

    #[test]
    fn order_clause_rejects_unknown_columns() {
        assert!(order_clause(Some("price; DROP TABLE products"), None).is_err());
        assert!(order_clause(Some("price"), Some("sideways")).is_err());
    }

    #[test]
    fn update_distinguishes_null_from_missing() {
        let clear: UpdateProductRequest =
            serde_json::from_str(r#"{"sku": null, "low_stock_threshold": null}"#).unwrap();
        assert_eq!(clear.sku, Some(None));
        assert_eq!(clear.low_stock_threshold, Some(None));

        let keep: UpdateProductRequest = serde_json::from_str(r#"{"price": 4.5}"#).unwrap();
        assert_eq!(keep.sku, None);
        assert_eq!(keep.low_stock_threshold, None);

        let set: UpdateProductRequest = serde_json::from_str(r#"{"low_stock_threshold": 3}"#).unwrap();
        assert_eq!(set.low_stock_threshold, Some(Some(3)));
    }

    #[test]
    fn field_validation() {
        assert!(validate_fields(Some("Tea"), Some("شاي"), Some(3.0), Some(5)).is_ok());
        assert!(validate_fields(Some("  "), Some("شاي"), None, None).is_err());
        assert!(validate_fields(None, None, Some(-1.0), None).is_err());
        assert!(validate_fields(None, None, None, Some(-2)).is_err());
        assert!(validate_fields(None, None, None, None).is_ok());
    }
}
