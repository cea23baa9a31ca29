pub mod handlers;
pub mod routes;
pub mod state;

pub use handlers::*;
pub use routes::*;
pub use state::*;

use protomock_engine::MockEngine;
use protomock_models::Config;
use protomock_store::PrototypeStore;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub async fn start_server(
    config: Config,
    store: Arc<dyn PrototypeStore>,
    engine: Arc<MockEngine>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bind = config.server.bind.clone();
    let port = config.server.port;
    let app_state = AppState::new(config, store, engine);

    let app = build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind, port)).await?;
    info!("Protomock API server listening on {}:{}", bind, port);

    axum::serve(listener, app).await?;
    Ok(())
}
