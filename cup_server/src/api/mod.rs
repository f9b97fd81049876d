//! HTTP/WebSocket API for the cup server.
//!
//! # Modules
//!
//! - [`matches`]: scores, matches, result submission, schedule, bracket rebuild
//! - [`teams`]: team listing, team edits, registration submission
//! - [`websocket`]: live push channel for in-progress matches
//! - [`request_id`]: request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET   /health                           - Storage health + subscriber count
//! GET   /ws/scores                        - Live scores (WebSocket)
//! GET   /api/v1/scores                    - All matches as a score snapshot
//! GET   /api/v1/scores/live               - In-progress matches
//! GET   /api/v1/matches                   - Matches with bracket fields
//! GET   /api/v1/matches/{id}              - One match
//! POST  /api/v1/matches/{id}/result       - Submit a score update
//! POST  /api/v1/bracket/rebuild           - Regenerate the bracket now
//! GET   /api/v1/schedule                  - Rounds, live and upcoming
//! GET   /api/v1/teams                     - Teams by team number
//! GET   /api/v1/teams/{team_number}       - Team with players
//! PATCH /api/v1/teams/{team_number}       - Edit team metadata
//! POST  /api/v1/registrations             - Register a team
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cup_bracket::db::{InMemoryMatchRepository, InMemoryTeamRepository};
//! use cup_bracket::feed::{LiveFeed, notifier, spawn_publisher};
//! use cup_bracket::{TournamentConfig, TournamentManager};
//! use cup_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let teams = Arc::new(InMemoryTeamRepository::new());
//! let matches = Arc::new(InMemoryMatchRepository::new());
//! let feed = Arc::new(LiveFeed::default());
//! let (events, receiver) = notifier(64);
//! spawn_publisher(feed.clone(), teams.clone(), matches.clone(), receiver);
//!
//! let state = AppState {
//!     tournament: Arc::new(TournamentManager::new(
//!         teams,
//!         matches,
//!         TournamentConfig::default(),
//!         events,
//!     )),
//!     feed,
//! };
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. Restrict origins before exposing the
//! result submission endpoints publicly.

pub mod matches;
pub mod request_id;
pub mod teams;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use cup_bracket::registration::FieldError;
use cup_bracket::{TournamentError, TournamentManager, feed::LiveFeed};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    /// Serializes every mutation and answers queries
    pub tournament: Arc<TournamentManager>,
    /// The "scores" broadcast group
    pub feed: Arc<LiveFeed>,
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Per-field problems of a rejected submission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Error half of every handler's return type
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a tournament error onto a status code and a client-safe body
pub fn api_error(err: TournamentError) -> ApiError {
    let status = match &err {
        TournamentError::Validation(_)
        | TournamentError::InvalidScore(_)
        | TournamentError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
        TournamentError::MatchNotFound(_) | TournamentError::TeamNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        TournamentError::Storage(e) => {
            tracing::error!("Storage failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let fields = err
        .field_errors()
        .map(|errors| errors.fields().to_vec())
        .unwrap_or_default();

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
            fields,
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws/scores", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let score_routes = Router::new()
        .route("/scores", get(matches::all_scores))
        .route("/scores/live", get(matches::live_scores))
        .route("/matches", get(matches::list_matches))
        .route("/matches/{match_id}", get(matches::get_match))
        .route("/matches/{match_id}/result", post(matches::submit_result))
        .route("/bracket/rebuild", post(matches::rebuild_bracket))
        .route("/schedule", get(matches::schedule));

    let team_routes = Router::new()
        .route("/teams", get(teams::list_teams))
        .route(
            "/teams/{team_number}",
            get(teams::get_team).patch(teams::update_team),
        )
        .route("/registrations", post(teams::register_team));

    Router::new().merge(score_routes).merge(team_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when both stores answer, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"healthy","storage":true,"subscribers":3,"version":"1.0.0","timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = match state.tournament.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let subscribers = state.feed.subscriber_count().await;

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "subscribers": subscribers,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cup_bracket::db::StoreError;
    use cup_bracket::registration::ValidationErrors;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            api_error(TournamentError::MatchNotFound(7)).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            api_error(TournamentError::InvalidScore(-1)).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            api_error(TournamentError::UnknownStatus("paused".to_string())).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_error_is_sanitized() {
        let (status, Json(body)) = api_error(TournamentError::Storage(StoreError::Corrupt {
            entity: "match",
            reason: "bad status".to_string(),
        }));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_validation_fields_are_listed() {
        let errors = ValidationErrors(vec![FieldError {
            field: "email".to_string(),
            message: "invalid email address".to_string(),
        }]);
        let (status, Json(body)) = api_error(TournamentError::Validation(errors));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.fields.len(), 1);
        assert_eq!(body.fields[0].field, "email");
    }
}
