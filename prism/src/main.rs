#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::Args;
use clap::Parser;
use prism_config::Config;
use prism_gateway::{Gateway, gateway_router};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("PRISM_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        tracing::warn!(config_path = %args.config.display(), "config file not found, using defaults");
        Config::default()
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    let listen = config.server.listen;

    tracing::info!(
        config_path = %args.config.display(),
        %listen,
        upstream = %config.upstream.primary.name,
        "starting prism"
    );

    let gateway = Gateway::new(config);

    // Graceful shutdown fans out through one token
    let shutdown = CancellationToken::new();
    let sweeper = gateway.spawn_context_sweeper(shutdown.clone());

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.cancel();
    });

    let listener = tokio::net::TcpListener::bind(listen).await?;
    let router = gateway_router(gateway);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    sweeper.await?;

    tracing::info!("prism stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
