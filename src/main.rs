use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use promptshare::config::{AppConfig, LogFormat, LoggingConfig};
use promptshare::http::{self, AppState, HttpServer, JwtAuthenticator};
use promptshare::ratelimit::{Janitor, RateLimiter};
use promptshare::store::InMemoryPromptStore;

/// Prompt sharing API with per-IP and per-user rate limiting.
#[derive(Debug, Parser)]
#[command(name = "promptshare", version)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP listen address
    #[arg(long)]
    http_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(addr) = args.http_addr {
        config.server.http_addr = addr;
    }

    init_tracing(&config.logging);

    info!("Starting Promptshare API");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    info!(http_addr = %config.server.http_addr, "Configuration loaded");

    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limiting));
    let janitor = Janitor::start(limiter.clone(), config.rate_limiting.cleanup_interval());
    info!(
        global_limit = config.rate_limiting.global.limit(),
        write_path_limit = config.rate_limiting.write_path.limit(),
        "Rate limiter initialized"
    );

    let secret = config.auth.jwt_secret.as_deref().unwrap_or_default();
    let state = AppState {
        limiter,
        prompts: Arc::new(InMemoryPromptStore::new()),
        auth: Arc::new(JwtAuthenticator::from_secret(secret.as_bytes())),
        trust_proxy: config.rate_limiting.trust_proxy,
    };

    let router = http::router(state, &config.cors);
    let server = HttpServer::bind(config.server.http_addr, router).await?;

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    janitor.stop().await;
    info!("Promptshare API stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
