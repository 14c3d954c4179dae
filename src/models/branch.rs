use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Branch {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub address: Option<String>,
    pub is_main_branch: bool,
    pub created_at: DateTime<Utc>,
}
