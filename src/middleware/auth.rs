use axum::{response::{Response, IntoResponse}};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::ROLE_OWNER;
use crate::state::AppState;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: String,
    pub username: String,
}

impl AuthContext {
    pub fn require_owner(&self, action: &str) -> Result<(), AppError> {
        if self.role != ROLE_OWNER {
            return Err(AppError::forbidden(format!("Only store owners can {action}")));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_header = match req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let claims = match verify_token(token, &state.jwt_secret) {
        Ok(c) => c,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        role: claims.role,
        username: claims.username,
    });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_cannot_act_as_owner() {
        let staff = AuthContext { user_id: 2, role: "staff".into(), username: "sam".into() };
        let owner = AuthContext { user_id: 1, role: "owner".into(), username: "mona".into() };

        assert!(matches!(staff.require_owner("delete branches"), Err(AppError::Forbidden(_))));
        assert!(owner.require_owner("delete branches").is_ok());
    }
}
