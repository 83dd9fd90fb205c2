use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use contracts::{
    AggregateTotal, ApiError, CreditReason, ErrorCode, GoalKind, GoalPeriod, GoalProgressOutcome,
    GoalSetSnapshot, LeaderboardEntry, MetricKind, ProviderStatus, RewardConfig, RewardEvent,
    StepEvaluation, TipKind, TipTransaction, TokenExchangeRequest, TokenExchangeResponse,
    WalletSummary, SCHEMA_VERSION_V1,
};
use rewards_core::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tokio::time;
use tracing::info;

use crate::provider::ProviderError;
use crate::{ProviderClient, RewardsApi};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 1000;

include!("error.rs");
include!("state.rs");
include!("routes/wallet.rs");
include!("routes/activity.rs");
include!("routes/tips.rs");
include!("routes/provider.rs");
include!("routes/stream.rs");
include!("util.rs");

pub async fn serve(
    addr: SocketAddr,
    api: RewardsApi,
    provider: ProviderClient,
) -> Result<(), ServerError> {
    let state = AppState::new(api, provider);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "reward api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/wallets/{address}", get(get_wallet))
        .route("/api/v1/wallets/{address}/credit", post(credit_wallet))
        .route("/api/v1/wallets/{address}/steps", post(report_steps))
        .route("/api/v1/wallets/{address}/goals", get(get_goals))
        .route(
            "/api/v1/wallets/{address}/goals/progress",
            post(report_goal_progress),
        )
        .route("/api/v1/leaderboard", get(get_leaderboard))
        .route("/api/v1/tips", post(send_tip).get(get_tips))
        .route(
            "/api/v1/trainers/{address}/earnings",
            get(get_trainer_earnings),
        )
        .route("/api/v1/provider/status", get(get_provider_status))
        .route("/api/v1/provider/token", post(exchange_provider_token))
        .route("/api/v1/provider/aggregate", get(get_provider_aggregate))
        .route("/api/v1/events", get(get_events))
        .route("/api/v1/stream", get(stream_events))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
