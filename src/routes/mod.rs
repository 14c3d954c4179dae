pub mod branches;
pub mod inventory;
pub mod products;
pub mod stores;
pub mod users;

use axum::Router;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes(state.clone()))
        .merge(stores::routes(state.clone()))
        .merge(branches::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(inventory::routes(state))
}
