use std::sync::Arc;

use bookmarks_api::app;
use bookmarks_api::config::{Cli, Config, default_config_dir, default_config_path};
use bookmarks_api::db::Database;
use bookmarks_api::handler::AppState;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    dotenvy::dotenv().ok();

    // --config decides the data directory too: the database lives next to the config file.
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("bookmarks.svc starting");

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let db = Arc::new(Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    let api_token = cfg.app.get_api_token();
    if api_token.is_none() {
        tracing::warn!("no api_token configured, bookmark routes are unauthenticated");
    }

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let app = app(AppState::new(db, api_token));

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("bookmarks.svc running on {}", &address);
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    tracing::info!("bookmarks.svc going off, graceful shutdown complete");
}
