use anyhow::Result;
use session_registry::SessionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use pg_assistant_api::config::Settings;
use pg_assistant_api::database::PgDatabaseClient;
use pg_assistant_api::router::build_router;
use pg_assistant_api::services::GeminiSqlGenerator;
use pg_assistant_api::state::AppState;
use pg_assistant_api::utils::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    info!("Starting Postgres Assistant API...");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let sessions = SessionRegistry::new(&settings.session);
    let sweeper = sessions.spawn_sweeper(settings.session.sweep_interval());

    let database = Arc::new(PgDatabaseClient::new(&settings.database));
    let generator = Arc::new(GeminiSqlGenerator::new(settings.gemini.clone())?);
    if settings.gemini.api_key.is_none() && settings.gemini.access_token.is_none() {
        tracing::warn!("No Gemini credentials configured; /api/nl2sql will fail");
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let state = AppState::new(sessions, database, generator, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
