use axum::{
    routing::{get, post},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::store::{add_staff, create_store, get_store};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stores", post(create_store))
        .route("/stores/{id}", get(get_store))
        .route("/stores/{id}/staff", post(add_staff))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
