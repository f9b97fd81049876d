//! Score, match and schedule endpoints.
//!
//! # Examples
//!
//! Pull every match:
//! ```bash
//! curl http://localhost:8000/api/v1/scores
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/matches/3/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"score1": 21, "score2": 17, "status": "finished"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
};
use cup_bracket::{
    Match, MatchId,
    feed::ScoreSnapshot,
    results::ResultUpdate,
    tournament::{RebuildOutcome, ResultOutcome, Schedule},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{ApiError, AppState, api_error};
use crate::{logging, metrics};

/// Score update body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub score1: i64,
    pub score2: i64,
    /// `upcoming`, `live` or `finished`
    pub status: String,
}

/// Every match with team names resolved.
///
/// # Response
///
/// ```json
/// {"matches": [{"id": 1, "team1": "Aces", "team2": "TBD", "score1": 0, "score2": 0, "status": "upcoming"}]}
/// ```
pub async fn all_scores(State(state): State<AppState>) -> Result<Json<ScoreSnapshot>, ApiError> {
    state
        .tournament
        .full_snapshot()
        .await
        .map(Json)
        .map_err(api_error)
}

/// Matches currently in progress, the same payload the live feed pushes
pub async fn live_scores(State(state): State<AppState>) -> Result<Json<ScoreSnapshot>, ApiError> {
    state
        .tournament
        .live_snapshot()
        .await
        .map(Json)
        .map_err(api_error)
}

/// All matches with their bracket fields, by round then start time
pub async fn list_matches(State(state): State<AppState>) -> Result<Json<Vec<Match>>, ApiError> {
    state
        .tournament
        .list_matches()
        .await
        .map(Json)
        .map_err(api_error)
}

/// # Errors
///
/// - `404 Not Found`: No match with this id
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, ApiError> {
    state
        .tournament
        .get_match(match_id)
        .await
        .map(Json)
        .map_err(api_error)
}

/// Record a score update for one match.
///
/// The winner is derived from the scores once the status is `finished` and
/// moves into the next match when it has a free slot.
///
/// # Response
///
/// Returns `200 OK` with the updated match, and the next match when the
/// winner was placed into it.
///
/// # Errors
///
/// - `400 Bad Request`: Negative or oversized score, unknown status
/// - `404 Not Found`: No match with this id
pub async fn submit_result(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(submission): Json<ResultSubmission>,
) -> Result<Json<ResultOutcome>, ApiError> {
    let update = ResultUpdate::parse(submission.score1, submission.score2, &submission.status)
        .map_err(api_error)?;

    let outcome = state
        .tournament
        .apply_result(match_id, update)
        .await
        .map_err(api_error)?;

    metrics::results_recorded_total(update.status.as_str());
    if let Some(next) = &outcome.next_match {
        tracing::info!(
            match_id = match_id,
            next_match = next.id,
            "Winner advanced to next match"
        );
    }

    Ok(Json(outcome))
}

/// Discard all matches and regenerate the bracket from the registered teams.
///
/// Honors the configured rebuild policy, so the response may report that the
/// rebuild was skipped.
pub async fn rebuild_bracket(
    State(state): State<AppState>,
) -> Result<Json<RebuildOutcome>, ApiError> {
    let started = Instant::now();
    let outcome = state
        .tournament
        .rebuild_bracket()
        .await
        .map_err(api_error)?;

    record_rebuild(&outcome);
    logging::log_performance(
        "bracket_rebuild",
        started.elapsed().as_millis() as u64,
        Some("operator request"),
    );

    Ok(Json(outcome))
}

/// Matches grouped by round, plus the live and upcoming lists
pub async fn schedule(State(state): State<AppState>) -> Result<Json<Schedule>, ApiError> {
    state
        .tournament
        .schedule()
        .await
        .map(Json)
        .map_err(api_error)
}

pub(crate) fn record_rebuild(outcome: &RebuildOutcome) {
    let label = match outcome {
        RebuildOutcome::Rebuilt { .. } => "rebuilt",
        RebuildOutcome::Cleared => "cleared",
        RebuildOutcome::Skipped => "skipped",
    };
    metrics::bracket_rebuilds_total(label);
}
