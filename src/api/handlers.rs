//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, ResultRecord, ResultsQuery};
use crate::rules::RuleSet;
use crate::runner::Summary;

/// `GET /summary` → 200 + `Summary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.summary.clone())
}

/// Returns hourly results, optionally filtered by hour range.
///
/// `GET /results` → 200 + `Vec<ResultRecord>` JSON
/// `GET /results?from=N&to=M` → filtered range (inclusive)
/// `GET /results?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResultsQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<ResultRecord> = state
        .rows
        .iter()
        .filter(|r| r.t >= from && r.t <= to)
        .map(ResultRecord::from)
        .collect();

    Ok(Json(records))
}

/// `GET /strategy` → 200 + rule set JSON, loadable as a strategy file
pub async fn get_strategy(State(state): State<Arc<AppState>>) -> Json<RuleSet> {
    Json(state.rules.clone())
}
