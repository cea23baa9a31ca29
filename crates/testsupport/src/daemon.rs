use anyhow::{bail, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::sleep;

#[derive(Debug)]
pub struct TestDaemon {
    pub base_url: String,
    process: Child,
}

impl TestDaemon {
    pub async fn kill(&mut self) -> Result<()> {
        self.process.kill().await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverride {
    pub port: Option<u16>,
    pub ttl_ms: Option<u64>,
}

/// Spawns the real server binary with config overrides supplied through the
/// environment, then waits for the health endpoint to come up.
pub async fn spawn_daemon(config_override: Option<ConfigOverride>) -> Result<TestDaemon> {
    let overrides = config_override.unwrap_or_default();
    let port = overrides.port.unwrap_or(18080);

    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--bin", "protomock-server"]);
    cmd.env("PROTOMOCK_BIND", "127.0.0.1");
    cmd.env("PROTOMOCK_PORT", port.to_string());
    if let Some(ttl_ms) = overrides.ttl_ms {
        cmd.env("PROTOMOCK_TTL_MS", ttl_ms.to_string());
    }
    cmd.current_dir(std::env::current_dir()?);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let process = cmd.spawn()?;
    let base_url = format!("http://127.0.0.1:{}", port);

    // First run may compile the workspace; keep polling until the server
    // answers.
    let client = reqwest::Client::new();
    for _ in 0..240 {
        if let Ok(resp) = client.get(format!("{}/healthz", base_url)).send().await {
            if resp.status().is_success() {
                return Ok(TestDaemon { base_url, process });
            }
        }
        sleep(Duration::from_millis(500)).await;
    }

    bail!("protomock-server did not become healthy on {}", base_url)
}
