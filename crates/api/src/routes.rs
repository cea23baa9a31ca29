use axum::{
    routing::{any, delete, get, patch, post},
    Router,
};

use crate::{handlers::*, AppState};

pub fn create_router(serve_prefix: &str) -> Router<AppState> {
    let mock_routes = Router::new().route("/*path", any(serve_mock));

    Router::new()
        // Prototype administration
        .route("/v1/prototypes", post(create_prototype))
        .route("/v1/prototypes", get(list_prototypes))
        .route("/v1/prototypes/:id", get(get_prototype))
        .route("/v1/prototypes/:id", patch(patch_prototype))
        .route("/v1/prototypes/:id", delete(delete_prototype))
        // Mock serving
        .nest(serve_prefix, mock_routes)
        // Health
        .route("/healthz", get(health_check))
}

pub fn build_router(state: AppState) -> Router {
    let serve_prefix = state.config.mock.serve_prefix.clone();
    create_router(&serve_prefix).with_state(state)
}
