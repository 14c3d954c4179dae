// src/database.rs
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Postgres SQLSTATE for unique violations.
pub const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign key violations.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres SQLSTATE for a missing relation (table or view).
pub const UNDEFINED_TABLE: &str = "42P01";

pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}
