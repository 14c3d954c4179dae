use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::branch::BranchResponse;

/// Onboarding payload: the store and its main branch are created together.
#[derive(Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub main_branch_name_en: String,
    pub main_branch_name_ar: String,
    pub main_branch_address: Option<String>,
}

#[derive(Serialize)]
pub struct StoreResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub branches: Vec<BranchResponse>,
}
