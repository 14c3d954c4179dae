use axum::{
    routing::{get, post},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::inventory;
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/inventory", get(inventory::get_inventory_overview))
        .route("/inventory/low-stock", get(inventory::get_low_stock))
        .route("/inventory/products/{id}", get(inventory::get_product_stock))
        .route("/inventory/adjust", post(inventory::adjust_inventory))
        .route("/inventory/transactions", get(inventory::list_transactions))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
