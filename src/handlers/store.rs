use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dtos::branch::BranchResponse;
use crate::auth::access::authorize_store;
use crate::dtos::store::{CreateStoreRequest, StoreResponse};
use crate::dtos::user::{CreateStaffRequest, UserResponse};
use crate::error::AppError;
use crate::handlers::branch::load_branches;
use crate::handlers::user::{insert_user, to_response, validate_credentials};
use crate::middleware::auth::AuthContext;
use crate::models::branch::Branch;
use crate::models::store::Store;
use crate::models::user::ROLE_STAFF;
use crate::state::AppState;

// POST /stores - Onboarding: store plus its main branch, atomically
#[instrument(skip(state, auth, req))]
pub async fn create_store(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreResponse>), AppError> {
    auth.require_owner("create stores")?;

    if req.name.trim().is_empty() {
        return Err(AppError::validation("Store name is required"));
    }
    if req.main_branch_name_en.trim().is_empty() || req.main_branch_name_ar.trim().is_empty() {
        return Err(AppError::validation("Main branch name is required in both languages"));
    }

    let mut tx = state.db_pool.begin().await?;

    let store = sqlx::query_as::<_, Store>(
        "INSERT INTO stores (name, owner_id) VALUES ($1, $2)
         RETURNING id, name, owner_id, created_at",
    )
    .bind(req.name.trim())
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let main_branch = sqlx::query_as::<_, Branch>(
        "INSERT INTO store_branches (store_id, name_en, name_ar, address, is_main_branch)
         VALUES ($1, $2, $3, $4, TRUE)
         RETURNING id, store_id, name_en, name_ar, address, is_main_branch, created_at",
    )
    .bind(store.id)
    .bind(req.main_branch_name_en.trim())
    .bind(req.main_branch_name_ar.trim())
    .bind(req.main_branch_address)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(store_id = %store.id, owner_id = auth.user_id, "Store onboarded");
    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            id: store.id,
            name: store.name,
            owner_id: store.owner_id,
            created_at: store.created_at,
            branches: vec![BranchResponse::from(main_branch)],
        }),
    ))
}

#[instrument(skip(state, auth))]
pub async fn get_store(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoreResponse>, AppError> {
    authorize_store(&state.db_pool, &auth, id).await?;

    let store = sqlx::query_as::<_, Store>("SELECT id, name, owner_id, created_at FROM stores WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;

    let branches = load_branches(&state.db_pool, id).await?;

    Ok(Json(StoreResponse {
        id: store.id,
        name: store.name,
        owner_id: store.owner_id,
        created_at: store.created_at,
        branches: branches.into_iter().map(BranchResponse::from).collect(),
    }))
}

// POST /stores/:id/staff - Owner adds a staff account to the store
#[instrument(skip(state, auth, req))]
pub async fn add_staff(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    authorize_store(&state.db_pool, &auth, store_id)
        .await?
        .require_owner("add staff")?;
    validate_credentials(&req.username, &req.password)?;

    let mut tx = state.db_pool.begin().await?;

    let user = insert_user(&mut *tx, &req.username, &req.password, ROLE_STAFF).await?;

    sqlx::query("INSERT INTO store_staff (store_id, user_id) VALUES ($1, $2)")
        .bind(store_id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(%store_id, user_id = user.id, "Staff member added");
    Ok((StatusCode::CREATED, Json(to_response(user))))
}
