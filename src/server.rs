//! Status server — Axum endpoints for liveness probes and state
//! inspection.
//!
//! Read-only: handlers share the orchestrator's state behind an
//! `Arc<RwLock>` and never mutate it. CORS enabled for local
//! development.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::engine::cycle::SharedState;
use crate::types::{BetOutcome, BetRecord, BotState};

/// Start the status server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_server(state: SharedState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Status server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind status port");

        axum::serve(listener, app)
            .await
            .expect("Status server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/bets", get(get_bets))
        .route("/summary", get(get_summary))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub date: String,
    pub bets_placed: u32,
    pub bets_won: usize,
    pub bets_lost: usize,
    pub cumulative_loss: String,
    pub consecutive_losses: u32,
    pub history_size: usize,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET / — plain-text liveness line for uptime monitors.
async fn liveness() -> &'static str {
    "Bot is running"
}

/// GET /health
async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /state — the full persisted state, exactly as stored on disk.
async fn get_state(State(state): State<SharedState>) -> Json<BotState> {
    Json(state.read().await.clone())
}

/// GET /bets — the bet ledger, most recent last.
async fn get_bets(State(state): State<SharedState>) -> Json<Vec<BetRecord>> {
    Json(state.read().await.bets.clone())
}

/// GET /summary — today's counters at a glance.
async fn get_summary(State(state): State<SharedState>) -> Json<SummaryResponse> {
    let state = state.read().await;
    Json(SummaryResponse {
        date: state.daily.date.to_string(),
        bets_placed: state.daily.bets_placed,
        bets_won: count(&state, BetOutcome::Won),
        bets_lost: count(&state, BetOutcome::Lost),
        cumulative_loss: state.daily.cumulative_loss.to_string(),
        consecutive_losses: state.daily.consecutive_losses,
        history_size: state.history_matches.len(),
    })
}

fn count(state: &BotState, outcome: BetOutcome) -> usize {
    state.bets.iter().filter(|b| b.outcome == outcome).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
