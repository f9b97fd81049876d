//! Integration tests for the HTTP API.
//!
//! Every test drives the real router over in-memory storage.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cup_bracket::db::{InMemoryMatchRepository, InMemoryTeamRepository};
use cup_bracket::feed::{DEFAULT_EVENT_BUFFER, LiveFeed, notifier, spawn_publisher};
use cup_bracket::{TournamentConfig, TournamentManager};
use cup_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a test server over fresh in-memory stores
fn create_test_server() -> (Router, AppState) {
    let teams = Arc::new(InMemoryTeamRepository::new());
    let matches = Arc::new(InMemoryMatchRepository::new());
    let feed = Arc::new(LiveFeed::default());
    let (events, receiver) = notifier(DEFAULT_EVENT_BUFFER);
    spawn_publisher(feed.clone(), teams.clone(), matches.clone(), receiver);

    let state = AppState {
        tournament: Arc::new(TournamentManager::new(
            teams,
            matches,
            TournamentConfig::default(),
            events,
        )),
        feed,
    };

    (create_router(state.clone()), state)
}

fn registration(team_name: &str) -> Value {
    json!({
        "team_name": team_name,
        "captain_name": format!("{team_name} Captain"),
        "email": "captain@example.com",
        "phone": "098765 43210",
        "players": [
            {"name": "First", "id_card": "id_cards/first.png"},
            {"name": "Second", "id_card": "id_cards/second.png"}
        ]
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register_teams(app: &Router, names: &[&str]) {
    for name in names {
        let (status, body) = send(app, "POST", "/api/v1/registrations", Some(registration(name))).await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
    }
}

/// First round-1 match with two real teams
async fn contested_opening_match(app: &Router) -> Value {
    let (_, matches) = send(app, "GET", "/api/v1/matches", None).await;
    matches
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["round_number"] == 1 && !m["team1"].is_null() && !m["team2"].is_null())
        .cloned()
        .expect("no contested round-1 match")
}

// ============================================================================
// Health and Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], true);
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let (app, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/teams")
                .header(REQUEST_ID_HEADER, "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_registration_assigns_numbers_and_builds_bracket() {
    let (app, _) = create_test_server();

    let (status, body) = send(&app, "POST", "/api/v1/registrations", Some(registration("Aces"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team"]["team_number"], 1);
    assert_eq!(body["team"]["phone"], "+919876543210");
    assert_eq!(body["players_saved"], 2);
    assert_eq!(body["players_dropped"], 0);
    // One team is not enough for a match
    assert_eq!(body["bracket"]["outcome"], "cleared");

    register_teams(&app, &["Bolts", "Comets", "Dynamos"]).await;
    let (status, body) = send(&app, "POST", "/api/v1/registrations", Some(registration("Eagles"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team"]["team_number"], 5);
    assert_eq!(
        body["bracket"],
        json!({"outcome": "rebuilt", "bracket_size": 8, "matches": 6})
    );

    let (_, teams) = send(&app, "GET", "/api/v1/teams", None).await;
    let numbers: Vec<i64> = teams
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["team_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_invalid_registration_lists_fields_and_stores_nothing() {
    let (app, _) = create_test_server();

    let request = json!({
        "team_name": "",
        "captain_name": "Captain",
        "email": "not-an-email",
        "phone": "12345",
        "players": []
    });
    let (status, body) = send(&app, "POST", "/api/v1/registrations", Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"team_name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"players"));

    let (_, teams) = send(&app, "GET", "/api/v1/teams", None).await;
    assert_eq!(teams, json!([]));
}

#[tokio::test]
async fn test_incomplete_player_entries_are_dropped() {
    let (app, _) = create_test_server();

    let mut request = registration("Aces");
    request["players"] = json!([
        {"name": "Kept", "id_card": "id_cards/kept.png"},
        {"name": "No Card"},
        {"id_card": "id_cards/nameless.png"}
    ]);
    let (status, body) = send(&app, "POST", "/api/v1/registrations", Some(request)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["players_saved"], 1);
    assert_eq!(body["players_dropped"], 2);

    let (status, team) = send(&app, "GET", "/api/v1/teams/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["team_name"], "Aces");
    assert_eq!(team["players"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_registration_without_complete_players_is_rejected() {
    let (app, _) = create_test_server();

    let mut request = registration("Aces");
    request["players"] = json!([{"name": "No Card"}, {"name": "Also No Card"}]);
    let (status, body) = send(&app, "POST", "/api/v1/registrations", Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "players");

    let (_, teams) = send(&app, "GET", "/api/v1/teams", None).await;
    assert_eq!(teams, json!([]));
}

// ============================================================================
// Team Tests
// ============================================================================

#[tokio::test]
async fn test_team_update_renames_in_scores() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts"]).await;

    let (status, team) = send(
        &app,
        "PATCH",
        "/api/v1/teams/2",
        Some(json!({"team_name": "Thunderbolts"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["team_number"], 2);
    assert_eq!(team["team_name"], "Thunderbolts");
    assert_eq!(team["captain_name"], "Bolts Captain");

    let (_, scores) = send(&app, "GET", "/api/v1/scores", None).await;
    let names: Vec<&str> = scores["matches"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|m| [m["team1"].as_str().unwrap(), m["team2"].as_str().unwrap()])
        .collect();
    assert!(names.contains(&"Thunderbolts"));
}

#[tokio::test]
async fn test_unknown_team_is_not_found() {
    let (app, _) = create_test_server();

    let (status, body) = send(&app, "GET", "/api/v1/teams/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99"));

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/v1/teams/99",
        Some(json!({"captain_name": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_team_update_is_rejected() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces"]).await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/teams/1",
        Some(json!({"email": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");
}

// ============================================================================
// Score and Result Tests
// ============================================================================

#[tokio::test]
async fn test_scores_payload_uses_tbd_for_open_slots() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts", "Comets"]).await;

    let (status, scores) = send(&app, "GET", "/api/v1/scores", None).await;
    assert_eq!(status, StatusCode::OK);

    let matches = scores["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().any(|m| m["team2"] == "TBD"));
    for m in matches {
        for key in ["id", "team1", "team2", "score1", "score2", "status"] {
            assert!(m.get(key).is_some(), "missing {key} in {m}");
        }
    }
}

#[tokio::test]
async fn test_finished_result_advances_winner() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts", "Comets", "Dynamos"]).await;

    let opening = contested_opening_match(&app).await;
    let id = opening["id"].as_i64().unwrap();
    let team1 = opening["team1"].as_i64().unwrap();

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{id}/result"),
        Some(json!({"score1": 21, "score2": 17, "status": "finished"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["updated"]["winner"], team1);
    assert_eq!(outcome["updated"]["status"], "finished");
    let next = &outcome["next_match"];
    assert_eq!(next["id"], opening["next_match"]);
    assert!(next["team1"] == team1 || next["team2"] == team1);

    // Resubmitting does not place the winner twice
    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{id}/result"),
        Some(json!({"score1": 21, "score2": 17, "status": "finished"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(outcome["next_match"].is_null());

    let (_, stored) = send(&app, "GET", &format!("/api/v1/matches/{}", next["id"]), None).await;
    assert_eq!(stored["id"], next["id"]);
}

#[tokio::test]
async fn test_tied_finish_has_no_winner() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts"]).await;

    let opening = contested_opening_match(&app).await;
    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/matches/{}/result", opening["id"]),
        Some(json!({"score1": 10, "score2": 10, "status": "finished"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(outcome["updated"]["winner"].is_null());
}

#[tokio::test]
async fn test_bad_result_submissions() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts"]).await;
    let opening = contested_opening_match(&app).await;
    let uri = format!("/api/v1/matches/{}/result", opening["id"]);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"score1": -1, "score2": 3, "status": "live"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"score1": 1, "score2": 3, "status": "paused"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("paused"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/matches/9999/result",
        Some(json!({"score1": 1, "score2": 0, "status": "live"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing above touched the match
    let (_, stored) = send(&app, "GET", &format!("/api/v1/matches/{}", opening["id"]), None).await;
    assert_eq!(stored["status"], "upcoming");
    assert_eq!(stored["score1"], 0);
}

#[tokio::test]
async fn test_live_scores_and_schedule() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts", "Comets", "Dynamos"]).await;

    let (_, live) = send(&app, "GET", "/api/v1/scores/live", None).await;
    assert_eq!(live["matches"], json!([]));

    let opening = contested_opening_match(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/matches/{}/result", opening["id"]),
        Some(json!({"score1": 3, "score2": 1, "status": "live"})),
    )
    .await;

    let (_, live) = send(&app, "GET", "/api/v1/scores/live", None).await;
    let live = live["matches"].as_array().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0]["id"], opening["id"]);
    assert_eq!(live[0]["score1"], 3);

    let (status, schedule) = send(&app, "GET", "/api/v1/schedule", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule["rounds"].as_array().unwrap().len(), 2);
    assert_eq!(schedule["live"].as_array().unwrap().len(), 1);
    assert_eq!(schedule["upcoming"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rebuild_endpoint_discards_results() {
    let (app, _) = create_test_server();
    register_teams(&app, &["Aces", "Bolts"]).await;

    let opening = contested_opening_match(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/matches/{}/result", opening["id"]),
        Some(json!({"score1": 5, "score2": 2, "status": "live"})),
    )
    .await;

    let (status, outcome) = send(&app, "POST", "/api/v1/bracket/rebuild", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "rebuilt");

    let (_, live) = send(&app, "GET", "/api/v1/scores/live", None).await;
    assert_eq!(live["matches"], json!([]));
    let (status, _) = send(&app, "GET", &format!("/api/v1/matches/{}", opening["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
