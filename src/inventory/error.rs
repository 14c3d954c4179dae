use thiserror::Error;
use uuid::Uuid;

use super::adjustment::StrategyFailure;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Quantity must be a positive whole number, got {0:?}")]
    InvalidQuantity(String),

    #[error("Cannot remove {requested} units: only {available} available in this branch")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Branch not found: {0}")]
    BranchNotFound(Uuid),

    #[error("The main branch cannot be deleted")]
    MainBranchDeletion,

    #[error("Stock adjustment failed: {}", summarize(.0))]
    AdjustmentFailed(Vec<StrategyFailure>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn summarize(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no strategy available".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.strategy.as_str(), f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed call against the remote store. Keeps the database's message text,
/// which the branch guard inspects.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.message.to_lowercase().contains(needle)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let message = match err.as_database_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        Self { message }
    }
}
