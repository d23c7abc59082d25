mod app;
mod config;

use anyhow::Context;
use app::{app_router, AppState};
use config::ApiConfig;
use dotenvy::dotenv;
use lms_core::{spawn_sweeper, Catalog};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 优先读取 .env（若存在）
    let _ = dotenv();
    init_tracing();

    let config = ApiConfig::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => {
            info!("LMS_CATALOG_PATH not set; serving the demo catalog");
            Catalog::demo()
        }
    };

    for rule in config.rules.all() {
        info!(rule = %rule, "throttle rule active");
    }

    let state = AppState::new(catalog, config.rules, config.trust_proxy_headers);
    let sweeper = spawn_sweeper(
        state.throttle.clone(),
        config.sweep_interval,
        config.retention,
    );

    let app = app_router(state, config.cors_origins.clone());
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("starting API on {}", config.bind);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("API stopped");
    Ok(())
}

/// `LMS_LOG_FORMAT=json` switches to JSON lines; level comes from `RUST_LOG`.
fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LMS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
