use bcrypt::{hash, verify, DEFAULT_COST};
use crate::dtos::user::{RegisterUserRequest, UserResponse, LoginRequest, LoginResponse};
use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::database::{sqlstate, UNIQUE_VIOLATION};
use crate::error::AppError;
use crate::models::user::{User, ROLE_OWNER};
use axum::{extract::State, http::StatusCode, Json};
use crate::state::AppState;
use crate::middleware::auth::AuthContext;
use axum::extract::Extension;
use tracing::{info, instrument};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }
    Ok(())
}

/// Inserts an active user with a bcrypt hash of `password`.
pub(crate) async fn insert_user<'e, E>(
    executor: E,
    username: &str,
    password: &str,
    role: &str,
) -> Result<User, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    let password_hash = hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, $3)
        RETURNING id, username, password_hash, role, is_active, created_at
        "#,
    )
    .bind(username.trim())
    .bind(password_hash)
    .bind(role)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if sqlstate(&e).as_deref() == Some(UNIQUE_VIOLATION) {
            return AppError::conflict("Username already exists");
        }
        AppError::db(e)
    })
}

// POST /users/register - Merchant sign-up. Staff accounts are added by a store owner.
#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_credentials(&payload.username, &payload.password)?;

    let user = insert_user(&state.db_pool, &payload.username, &payload.password, ROLE_OWNER).await?;

    info!(user_id = user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(to_response(user))))
}

#[instrument(skip(state, payload))]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, username, password_hash, role, is_active, created_at FROM users WHERE username = $1"#,
    )
    .bind(payload.username.trim())
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::Unauthorized);
    }

    let token = sign_token(user.id, &user.role, &user.username, &state.jwt_secret)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: (TOKEN_TTL_HOURS * 60 * 60) as usize,
    }))
}

// Authenticated endpoint: returns full user profile from DB using the id in AuthContext
#[instrument(skip(state, auth))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, username, password_hash, role, is_active, created_at FROM users WHERE id = $1"#,
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(to_response(user)))
}

pub(crate) fn to_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        is_active: user.is_active,
        created_at: user.created_at,
    }
}
