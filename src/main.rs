// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_session::DashboardSession;
use crate::application::telemetry_source::TelemetrySource;
use crate::infrastructure::config::{load_dashboard_config, SourceSettings};
use crate::infrastructure::firebase_source::FirebaseSource;
use crate::infrastructure::replay_source::ReplaySource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{apply_action, current_frame, health_check, stream_frames};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let settings = config.session_settings()?;

    // Create source (infrastructure layer)
    let source: Box<dyn TelemetrySource> = match &config.source {
        SourceSettings::Firebase { database_url, path, auth, mode } => Box::new(
            FirebaseSource::new(database_url, path, auth.as_deref(), *mode),
        ),
        SourceSettings::Replay { file, interval_ms, mode } => Box::new(ReplaySource::new(
            file,
            Duration::from_millis(*interval_ms),
            *mode,
        )),
    };

    // Create session (application layer); the subscription lives until shutdown
    let session = Arc::new(DashboardSession::new(settings));
    let subscription = session.subscribe(source.as_ref()).await?;

    let state = Arc::new(AppState {
        session: session.clone(),
    });

    // Build router (presentation layer)
    // Responses are compressed per request in the handlers, not by a layer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(current_frame))
        .route("/dashboard/stream", get(stream_frames))
        .route("/dashboard/actions", post(apply_action))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting vehicle-telemetry dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    subscription.close();
    tracing::info!("dashboard stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
