use anyhow::{Context, Result};
use clap::Parser;
use live_assist::{create_router, AppState, Config};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "live-assist", about = "Real-time interview Live Assist service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/live-assist")]
    config: String,

    /// Override the HTTP port from the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recognizer NATS server: {}", cfg.capture.nats_url);
    info!("Generation backend: {}", cfg.suggest.base_url);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    let state = AppState::new(cfg).context("Failed to build application state")?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server error")?;

    Ok(())
}
