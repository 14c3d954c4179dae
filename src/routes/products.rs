use axum::{
    routing::{get, post, put},
    Router, middleware,
};
use crate::handlers::product::{
    get_products, get_product, create_product, update_product, delete_product,
    update_product_status, restore_product,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/products/{id}/status", put(update_product_status))
        .route("/products/{id}/restore", post(restore_product))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
