use std::time::Duration;

use agentic_core::observability::init_observability;
use agentic_server::{ServerConfig, router};
use anyhow::Context as _;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "agentic-server",
    version,
    about = "Serve scripted agent runs as SSE event streams"
)]
struct Cli {
    /// Bind host (overrides AGENTIC_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides AGENTIC_PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Pause between run steps in milliseconds (overrides AGENTIC_STEP_DELAY_MS).
    #[arg(long)]
    step_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_observability();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env().context("invalid server configuration")?;
    if let Some(host) = cli.host {
        config = config.host(host);
    }
    if let Some(port) = cli.port {
        config = config.port(port);
    }
    if let Some(ms) = cli.step_delay_ms {
        config = config.step_delay(Duration::from_millis(ms));
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "agentic server listening");
    info!("run stream: POST http://{addr}/agentic");

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
