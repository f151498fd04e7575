//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::scoreboard::RankedEntry;
use crate::game::EngineError;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::ArenaInfo;

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/game-state", get(game_state_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/api/stats/:external_id", get(stats_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.client_origin))
                .layer(TimeoutLayer::new(Duration::from_secs(10))),
        )
        .with_state(state)
}

/// CORS configuration - "*" or multiple origins (comma-separated in CLIENT_ORIGIN)
fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<header::HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    player_count: usize,
    projectile_count: usize,
}

async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let status = state.engine.status().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        player_count: status.player_count,
        projectile_count: status.projectile_count,
    }))
}

// ============================================================================
// Arena status
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameStateResponse {
    player_count: usize,
    arena: ArenaInfo,
}

async fn game_state_handler(
    State(state): State<AppState>,
) -> Result<Json<GameStateResponse>, AppError> {
    let status = state.engine.status().await?;

    Ok(Json(GameStateResponse {
        player_count: status.player_count,
        arena: status.arena,
    }))
}

// ============================================================================
// Score endpoints
// ============================================================================

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

async fn leaderboard_handler(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<RankedEntry>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT);

    Ok(Json(state.engine.leaderboard(limit).await?))
}

async fn stats_handler(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<RankedEntry>, AppError> {
    let score = state
        .engine
        .stats(external_id.clone())
        .await?
        .unwrap_or_default();

    Ok(Json(RankedEntry { external_id, score }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::game::EngineCommand;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "ARENA_SEED" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn game_state_reports_players_and_arena() {
        let state = test_state();
        state
            .engine
            .send(EngineCommand::Join {
                session_id: Uuid::new_v4(),
                external_id: "1".into(),
                display_name: "Ada".into(),
            })
            .await
            .unwrap();

        let (status, body) = get_json(build_router(state), "/api/game-state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["playerCount"], 1);
        assert_eq!(body["arena"]["width"], 800.0);
        assert_eq!(body["arena"]["height"], 600.0);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json(build_router(test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["playerCount"], 0);
    }

    #[tokio::test]
    async fn stats_for_unknown_identity_are_zero() {
        let (status, body) = get_json(build_router(test_state()), "/api/stats/nobody").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["externalId"], "nobody");
        assert_eq!(body["wins"], 0);
        assert_eq!(body["slapsThrown"], 0);
        assert_eq!(body["tokensEarned"], 0);
    }

    #[tokio::test]
    async fn leaderboard_lists_joined_identities() {
        let state = test_state();
        for id in ["a", "b", "c"] {
            state
                .engine
                .send(EngineCommand::Join {
                    session_id: Uuid::new_v4(),
                    external_id: id.into(),
                    display_name: id.into(),
                })
                .await
                .unwrap();
        }

        let (status, body) = get_json(build_router(state), "/api/leaderboard?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["externalId"], "a");
        assert_eq!(rows[1]["externalId"], "b");
    }

    #[test]
    fn engine_error_maps_to_503() {
        let response = AppError::from(EngineError::Unavailable).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
