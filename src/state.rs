// src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use crate::inventory::{InventoryStore, PgInventoryStore};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub store: Arc<dyn InventoryStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(db_pool: PgPool, jwt_secret: &str) -> Self {
        let store = Arc::new(PgInventoryStore::new(db_pool.clone()));
        Self {
            db_pool,
            store,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
