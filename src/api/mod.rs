//! REST API over a completed run.
//!
//! Provides three GET endpoints:
//! - `/summary`: strategy, status, energy balance, KPIs and warnings
//! - `/results`: hourly results with optional range filtering
//! - `/strategy`: the applied rule set, in the same JSON shape as a strategy file

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::rules::RuleSet;
use crate::runner::{Outcome, Summary};
use crate::sim::ResultRow;

pub use types::{ErrorResponse, ResultRecord, ResultsQuery};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run completes and wrapped in `Arc`; all data is
/// read-only.
pub struct AppState {
    pub summary: Summary,
    pub rows: Vec<ResultRow>,
    pub rules: RuleSet,
}

impl AppState {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        Self {
            summary: outcome.summary(),
            rows: outcome.rows.clone(),
            rules: outcome.run.rules().clone(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/results", get(handlers::get_results))
        .route("/strategy", get(handlers::get_strategy))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
