use protomock_engine::MockEngine;
use protomock_models::Config;
use protomock_store::PrototypeStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn PrototypeStore>,
    pub engine: Arc<MockEngine>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn PrototypeStore>, engine: Arc<MockEngine>) -> Self {
        Self {
            config,
            store,
            engine,
        }
    }
}
