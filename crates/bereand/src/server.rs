//! HTTP server for bereand.

use crate::config::Config;
use crate::mailer::Mailer;
use crate::orchestrator::AgentRunner;
use crate::routes;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers. Clients are read-only after
/// startup; the runner and mailer sit behind traits for test substitution.
pub struct AppState {
    pub config: Config,
    pub runner: Arc<dyn AgentRunner>,
    pub mailer: Arc<dyn Mailer>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn AgentRunner>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            config,
            runner,
            mailer,
            start_time: Instant::now(),
        }
    }
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::verse_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the listener fails.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
