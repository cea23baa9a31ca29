use anyhow::Result;
use protomock_engine::MockEngine;
use protomock_models::Config;
use protomock_schema::SchemaValidator;
use protomock_store::InMemoryPrototypeStore;
use protomock_template::{GeneratorRegistry, TemplateResolver};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_paths = ["configs/default.toml", "config/config.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }
    }

    Err("No config file found".into())
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(bind) = std::env::var("PROTOMOCK_BIND") {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("PROTOMOCK_PORT") {
        if let Ok(port) = port.parse() {
            config.server.port = port;
        }
    }
    if let Ok(ttl_ms) = std::env::var("PROTOMOCK_TTL_MS") {
        if let Ok(ttl_ms) = ttl_ms.parse() {
            config.store.ttl_ms = ttl_ms;
        }
    }
    if let Ok(prefix) = std::env::var("PROTOMOCK_SERVE_PREFIX") {
        config.mock.serve_prefix = prefix;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    info!("Starting Protomock server");

    let mut config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}, using defaults", e);
        Config::default()
    });
    apply_env_overrides(&mut config);
    info!("Configuration loaded: {:?}", config);

    let store = Arc::new(InMemoryPrototypeStore::new(Duration::from_millis(
        config.store.ttl_ms,
    )));
    let registry = Arc::new(GeneratorRegistry::builtin());
    let engine = Arc::new(MockEngine::new(
        store.clone(),
        SchemaValidator::new(),
        TemplateResolver::new(registry),
    ));

    protomock_api::start_server(config, store, engine)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    Ok(())
}
