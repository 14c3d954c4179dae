use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_STAFF: &str = "staff";
