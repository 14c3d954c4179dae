use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::access::authorize_store;
use crate::database::{sqlstate, FOREIGN_KEY_VIOLATION};
use crate::dtos::branch::{BranchResponse, CreateBranchRequest, UpdateBranchRequest};
use crate::error::AppError;
use crate::inventory;
use crate::middleware::auth::AuthContext;
use crate::models::branch::Branch;
use crate::state::AppState;

const BRANCH_COLUMNS: &str = "id, store_id, name_en, name_ar, address, is_main_branch, created_at";

/// Branches of a store, main branch first.
pub(crate) async fn load_branches(pool: &PgPool, store_id: Uuid) -> Result<Vec<Branch>, AppError> {
    let branches = sqlx::query_as::<_, Branch>(&format!(
        "SELECT {BRANCH_COLUMNS} FROM store_branches
         WHERE store_id = $1
         ORDER BY is_main_branch DESC, created_at ASC"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(branches)
}

pub(crate) async fn fetch_branch(pool: &PgPool, id: Uuid) -> Result<Branch, AppError> {
    sqlx::query_as::<_, Branch>(&format!("SELECT {BRANCH_COLUMNS} FROM store_branches WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Branch not found"))
}

fn validate_names(name_en: Option<&str>, name_ar: Option<&str>) -> Result<(), AppError> {
    if name_en.is_some_and(|n| n.trim().is_empty()) || name_ar.is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Branch name is required in both languages"));
    }
    Ok(())
}

#[instrument(skip(state, auth))]
pub async fn list_branches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<Vec<BranchResponse>>, AppError> {
    authorize_store(&state.db_pool, &auth, store_id).await?;
    let branches = load_branches(&state.db_pool, store_id).await?;
    Ok(Json(branches.into_iter().map(BranchResponse::from).collect()))
}

#[instrument(skip(state, auth))]
pub async fn get_branch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BranchResponse>, AppError> {
    let branch = fetch_branch(&state.db_pool, id).await?;
    authorize_store(&state.db_pool, &auth, branch.store_id).await?;
    Ok(Json(branch.into()))
}

#[instrument(skip(state, auth, req))]
pub async fn create_branch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<BranchResponse>), AppError> {
    validate_names(Some(&req.name_en), Some(&req.name_ar))?;
    let access = authorize_store(&state.db_pool, &auth, store_id).await?;
    if req.is_main_branch {
        access.require_owner("change the main branch")?;
    }

    let mut tx = state.db_pool.begin().await?;

    // A store's first branch is always its main branch.
    let has_branches = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM store_branches WHERE store_id = $1)",
    )
    .bind(store_id)
    .fetch_one(&mut *tx)
    .await?;
    let is_main = req.is_main_branch || !has_branches;

    if is_main {
        sqlx::query("UPDATE store_branches SET is_main_branch = FALSE WHERE store_id = $1 AND is_main_branch")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
    }

    let branch = sqlx::query_as::<_, Branch>(&format!(
        "INSERT INTO store_branches (store_id, name_en, name_ar, address, is_main_branch)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {BRANCH_COLUMNS}"
    ))
    .bind(store_id)
    .bind(req.name_en.trim())
    .bind(req.name_ar.trim())
    .bind(req.address)
    .bind(is_main)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if sqlstate(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return AppError::validation("Invalid store_id");
        }
        AppError::db(e)
    })?;

    tx.commit().await?;

    info!(branch_id = %branch.id, %store_id, is_main, "Branch created");
    Ok((StatusCode::CREATED, Json(branch.into())))
}

#[instrument(skip(state, auth, req))]
pub async fn update_branch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBranchRequest>,
) -> Result<Json<BranchResponse>, AppError> {
    validate_names(req.name_en.as_deref(), req.name_ar.as_deref())?;
    let existing = fetch_branch(&state.db_pool, id).await?;
    authorize_store(&state.db_pool, &auth, existing.store_id).await?;

    let branch = sqlx::query_as::<_, Branch>(&format!(
        "UPDATE store_branches SET
            name_en = COALESCE($2, name_en),
            name_ar = COALESCE($3, name_ar),
            address = COALESCE($4, address)
         WHERE id = $1
         RETURNING {BRANCH_COLUMNS}"
    ))
    .bind(id)
    .bind(req.name_en.as_deref().map(str::trim))
    .bind(req.name_ar.as_deref().map(str::trim))
    .bind(req.address)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Branch not found"))?;

    Ok(Json(branch.into()))
}

// POST /branches/:id/main - Make this the store's main branch
#[instrument(skip(state, auth))]
pub async fn set_main_branch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BranchResponse>, AppError> {
    let store_id = fetch_branch(&state.db_pool, id).await?.store_id;
    authorize_store(&state.db_pool, &auth, store_id)
        .await?
        .require_owner("change the main branch")?;

    let mut tx = state.db_pool.begin().await?;

    // Branches never move between stores, so the store resolved above still holds.
    sqlx::query("SELECT 1 FROM store_branches WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Branch not found"))?;

    sqlx::query("UPDATE store_branches SET is_main_branch = FALSE WHERE store_id = $1 AND is_main_branch AND id <> $2")
        .bind(store_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let branch = sqlx::query_as::<_, Branch>(&format!(
        "UPDATE store_branches SET is_main_branch = TRUE WHERE id = $1 RETURNING {BRANCH_COLUMNS}"
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(branch_id = %id, %store_id, "Main branch changed");
    Ok(Json(branch.into()))
}

#[instrument(skip(state, auth))]
pub async fn delete_branch(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let branch = fetch_branch(&state.db_pool, id).await?;
    authorize_store(&state.db_pool, &auth, branch.store_id)
        .await?
        .require_owner("delete branches")?;

    let deleted = inventory::delete_branch(state.store.as_ref(), id).await?;

    info!(branch_id = %id, store_id = %deleted.store_id, "Branch deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_names(Some("Downtown"), Some("وسط البلد")).is_ok());
        assert!(validate_names(Some(""), Some("وسط البلد")).is_err());
        assert!(validate_names(None, Some("   ")).is_err());
        assert!(validate_names(None, None).is_ok());
    }
}
