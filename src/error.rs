// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::inventory::InventoryError;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    ValidationError(String),
    BadGateway(String),
    Internal(String),
}

impl AppError {
    pub fn db(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        AppError::BadGateway(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error");
                "Database error occurred"
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error"
            }
            AppError::Unauthorized => "Unauthorized access",
            AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg)
            | AppError::BadGateway(msg) => msg.as_str(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InvalidQuantity(_) | InventoryError::InsufficientStock { .. } => {
                AppError::validation(err.to_string())
            }
            InventoryError::BranchNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            InventoryError::MainBranchDeletion => AppError::conflict(err.to_string()),
            InventoryError::AdjustmentFailed(_) => AppError::bad_gateway(err.to_string()),
            InventoryError::Store(e) => AppError::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StoreError;
    use uuid::Uuid;

    #[test]
    fn inventory_errors_map_to_expected_statuses() {
        let cases = [
            (InventoryError::InvalidQuantity("abc".into()), StatusCode::BAD_REQUEST),
            (
                InventoryError::InsufficientStock { available: 2, requested: 3 },
                StatusCode::BAD_REQUEST,
            ),
            (InventoryError::BranchNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (InventoryError::MainBranchDeletion, StatusCode::CONFLICT),
            (InventoryError::AdjustmentFailed(vec![]), StatusCode::BAD_GATEWAY),
            (InventoryError::Store(StoreError::new("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn conflict_body_carries_message() {
        let resp = AppError::conflict("Product SKU already exists").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
