use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}
