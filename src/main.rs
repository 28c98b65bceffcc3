//! Schema compliance service
//!
//! Compares a candidate database against a golden standard schema and reports
//! every drift with a severity, a compliance score and a migration verdict.
//! Snapshots can be uploaded for comparison, or captured live from two
//! PostgreSQL databases.

use schema_compliance::config::Settings;
use schema_compliance::routes::create_router;
use schema_compliance::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting schema compliance checker...");

    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");
    info!(
        "   Default engine: {} | capture timeout: {}s | reports: {}",
        settings.compliance.default_engine.display_name(),
        settings.compliance.capture_timeout.as_secs(),
        settings.compliance.report_dir.display()
    );

    let state = Arc::new(AppState::new(settings.clone()));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   GET  /health                        - Health check");
    info!("   POST /api/compliance/compare        - Compare two uploaded snapshots");
    info!("   POST /api/compliance/check          - Capture and compare two live databases");
    info!("   GET  /api/compliance/reports        - List stored reports");
    info!("   GET  /api/compliance/reports/{{id}}   - Fetch one report");
    info!("");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schema_compliance=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
