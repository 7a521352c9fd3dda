use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crowdalert_api::config::{LogFormat, ServerConfig, StoreBackend};
use crowdalert_api::router::build_app_router;
use crowdalert_api::state::AppState;
use crowdalert_api::uploads::UploadStore;
use crowdalert_db::store::{MemoryReportStore, PgReportStore, ReportStore};
use crowdalert_geocode::{Geocoder, NominatimGeocoder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crowdalert_api=debug,tower_http=debug".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Report store ---
    let store: Arc<dyn ReportStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = crowdalert_db::create_pool(database_url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            crowdalert_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            crowdalert_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Arc::new(PgReportStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory report store; reports are lost on restart");
            Arc::new(MemoryReportStore::new())
        }
    };

    // --- Geocoder ---
    let geocoder: Option<Arc<dyn Geocoder>> = if config.geocoder.enabled {
        let geocoder = NominatimGeocoder::new(
            config.geocoder.base_url.clone(),
            Duration::from_secs(config.geocoder.timeout_secs),
        )
        .context("Failed to build geocoding client")?;
        tracing::info!(base_url = geocoder.base_url(), "Forward geocoding enabled");
        Some(Arc::new(geocoder))
    } else {
        tracing::info!("Forward geocoding disabled");
        None
    };

    // --- Uploads ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;
    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    let state = AppState {
        store,
        config: Arc::new(config),
        geocoder,
        uploads,
    };
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
