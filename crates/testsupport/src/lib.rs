pub mod daemon;
pub mod http_client;

pub use daemon::{spawn_daemon, ConfigOverride, TestDaemon};
pub use http_client::TestClient;
