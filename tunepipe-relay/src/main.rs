//! tunepipe-relay - Main entry point
//!
//! Resolves source URLs through the audio resolution service and streams the
//! resulting tracks to browsers as MP3, transcoded per request by ffmpeg.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunepipe_common::config::{load_toml_config, ConfigOverrides};
use tunepipe_common::Config;
use tunepipe_relay::{build_router, AppState};

/// Command-line arguments for tunepipe-relay
#[derive(Parser, Debug)]
#[command(name = "tunepipe-relay")]
#[command(about = "Audio resolution and streaming relay")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 4000]
    #[arg(short, long, env = "TUNEPIPE_PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long, env = "TUNEPIPE_BIND")]
    bind: Option<IpAddr>,

    /// Base URL of the audio resolution service [default: http://localhost:5050]
    #[arg(short, long, env = "TUNEPIPE_RESOLVER_URL")]
    resolver_url: Option<String>,

    /// Transcoder executable [default: ffmpeg]
    #[arg(long, env = "TUNEPIPE_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// MP3 bitrate in kbps [default: 192]
    #[arg(long, env = "TUNEPIPE_BITRATE_KBPS")]
    bitrate_kbps: Option<u32>,

    /// Resolution request timeout in seconds [default: 30]
    #[arg(long, env = "TUNEPIPE_RESOLVER_TIMEOUT_SECS")]
    resolver_timeout_secs: Option<u64>,

    /// TOML config file (default: ~/.config/tunepipe/config.toml if present)
    #[arg(short, long, env = "TUNEPIPE_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            bind_address: self.bind,
            resolver_url: self.resolver_url.clone(),
            transcoder_path: self.ffmpeg.clone(),
            bitrate_kbps: self.bitrate_kbps,
            resolver_timeout_secs: self.resolver_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunepipe_relay=info,ffmpeg=warn,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting tunepipe-relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Parse command-line arguments
    let args = Args::parse();

    let overrides = args
        .overrides()
        .with_legacy_env()
        .context("Invalid environment")?;
    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = Config::resolve(overrides, toml).context("Invalid configuration")?;

    info!("Resolver: {}", config.resolver_endpoint());
    info!(
        "Transcoder: {} ({} kbps)",
        config.transcoder_path.display(),
        config.bitrate_kbps
    );

    let state = AppState::new(config).context("Failed to initialize application state")?;

    if !state.transcoder.is_available().await {
        warn!(
            "Transcoder {} did not run; /stream requests will fail until it is installed",
            state.transcoder.program().display()
        );
    }

    let addr = state.config.socket_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("tunepipe-relay listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
