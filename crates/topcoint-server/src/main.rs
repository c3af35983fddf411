mod config;
mod error;
mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use topcoint_core::{
    AssetDirectory, CoinDeskClient, DetailFetcher, RequestBroker, ReqwestHttpClient,
};

use crate::config::Config;
use crate::error::ServerError;
use crate::session::AppState;

#[derive(Debug, Parser)]
#[command(name = "topcoint", about = "Cryptocurrency lookup service over WebSocket")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?;
    info!(addr = %config.bind_addr(), upstream = %config.api_url, "starting topcoint");

    let upstream = CoinDeskClient::new(
        Arc::new(ReqwestHttpClient::new()),
        &config.api_url,
        &config.api_key,
    );
    let directory = Arc::new(AssetDirectory::new());

    // Warm the directory eagerly; a failure here is not fatal, the
    // scheduled refresh will retry.
    match directory.refresh(&upstream).await {
        Ok(count) => info!(assets = count, "asset directory warmed up"),
        Err(error) => warn!(%error, "initial directory refresh failed, retrying on schedule"),
    }

    let refresh_task = tokio::spawn(refresh_loop(
        directory.clone(),
        upstream.clone(),
        Duration::from_secs(config.refresh_interval_secs),
    ));

    let (broker, _worker) = RequestBroker::spawn(directory, DetailFetcher::new(upstream));
    let app = session::create_router(Arc::new(AppState { broker }));

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .map_err(ServerError::Bind)?;
    info!(addr = %config.bind_addr(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    refresh_task.abort();
    info!("topcoint stopped");
    Ok(())
}

/// Background directory refresh on a fixed cadence. Failures keep the
/// previous snapshot and are reported to the operator only.
async fn refresh_loop(directory: Arc<AssetDirectory>, upstream: CoinDeskClient, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The eager startup refresh already covered the first tick.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match directory.refresh(&upstream).await {
            Ok(count) => debug!(assets = count, "asset directory refreshed"),
            Err(error) => warn!(%error, "directory refresh failed, keeping previous snapshot"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("ctrl-c handler must install");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("signal handler must install")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received terminate signal"),
    }
}
