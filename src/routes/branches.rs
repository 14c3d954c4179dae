use axum::{
    routing::{get, post},
    Router, middleware,
};
use crate::state::AppState;
use crate::handlers::branch::{
    create_branch, delete_branch, get_branch, list_branches, set_main_branch, update_branch,
};
use crate::middleware::auth::require_auth;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stores/{id}/branches", get(list_branches).post(create_branch))
        .route("/branches/{id}", get(get_branch).put(update_branch).delete(delete_branch))
        .route("/branches/{id}/main", post(set_main_branch))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
