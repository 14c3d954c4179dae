use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::branch::Branch;

#[derive(Deserialize)]
pub struct CreateBranchRequest {
    pub name_en: String,
    pub name_ar: String,
    pub address: Option<String>,
    #[serde(default)]
    pub is_main_branch: bool,
}

#[derive(Deserialize)]
pub struct UpdateBranchRequest {
    pub name_en: Option<String>,
    pub name_ar: Option<String>,
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct BranchResponse {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub address: Option<String>,
    pub is_main_branch: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Branch> for BranchResponse {
    fn from(b: Branch) -> Self {
        Self {
            id: b.id,
            store_id: b.store_id,
            name_en: b.name_en,
            name_ar: b.name_ar,
            address: b.address,
            is_main_branch: b.is_main_branch,
            created_at: b.created_at,
        }
    }
}
