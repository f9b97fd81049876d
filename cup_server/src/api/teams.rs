//! Team and registration endpoints.
//!
//! # Examples
//!
//! Register a team:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/registrations \
//!   -H "Content-Type: application/json" \
//!   -d '{"team_name": "Aces", "captain_name": "Asha", "email": "asha@example.com",
//!        "phone": "098765 43210", "players": [{"name": "Ravi", "id_card": "id/ravi.png"}]}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use cup_bracket::{
    TeamNumber,
    registration::{RegistrationRequest, Team, TeamDetail, TeamUpdate},
    tournament::RegistrationOutcome,
};

use super::{ApiError, AppState, api_error, matches::record_rebuild, request_id::RequestId};
use crate::metrics;

/// Teams ordered by team number
pub async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>, ApiError> {
    state
        .tournament
        .list_teams()
        .await
        .map(Json)
        .map_err(api_error)
}

/// Team with its roster
///
/// # Errors
///
/// - `404 Not Found`: No team with this number
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_number): Path<TeamNumber>,
) -> Result<Json<TeamDetail>, ApiError> {
    state
        .tournament
        .get_team(team_number)
        .await
        .map(Json)
        .map_err(api_error)
}

/// Edit team metadata. Omitted fields are left as they are.
///
/// # Errors
///
/// - `400 Bad Request`: A provided field fails validation
/// - `404 Not Found`: No team with this number
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_number): Path<TeamNumber>,
    Json(update): Json<TeamUpdate>,
) -> Result<Json<Team>, ApiError> {
    state
        .tournament
        .update_team(team_number, update)
        .await
        .map(Json)
        .map_err(api_error)
}

/// Register a team and regenerate the bracket.
///
/// # Response
///
/// Returns `201 Created` with the stored team, how many player entries were
/// kept and dropped, and what happened to the bracket.
///
/// # Errors
///
/// - `400 Bad Request`: One or more fields are invalid; every problem is
///   listed under `fields` and nothing is stored
pub async fn register_team(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), ApiError> {
    match state.tournament.register_team(request).await {
        Ok(outcome) => {
            metrics::registrations_total();
            record_rebuild(&outcome.bracket);
            tracing::info!(
                request_id = %request_id,
                team_number = outcome.team.team_number,
                players_saved = outcome.players_saved,
                players_dropped = outcome.players_dropped,
                "Registration accepted"
            );
            Ok((StatusCode::CREATED, Json(outcome)))
        }
        Err(e) => {
            tracing::info!(
                request_id = %request_id,
                "Registration rejected: {}",
                e
            );
            Err(api_error(e))
        }
    }
}
