//! In-process mock of the merch-shop API.
//!
//! Used by the integration tests and for local runs of `coinload` without a
//! real target. Issues deterministic tokens, validates bearer headers on the
//! protected routes, and can be capped to a maximum TPS past which it answers
//! with 500s, which is handy for exercising failed-check paths.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{debug_handler, Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const TOKEN_PREFIX: &str = "mock-";

#[derive(Clone, Default)]
pub struct ShopConfig {
    /// Requests per second across all endpoints before the mock starts
    /// returning 500s. `None` means unlimited.
    pub max_tps: Option<u32>,
}

struct AppState {
    limiter: Option<DefaultDirectRateLimiter>,
}

pub async fn run(addr: SocketAddr, config: ShopConfig) {
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, router(config)).await.unwrap();
}

pub fn router(config: ShopConfig) -> Router {
    let state = Arc::new(AppState {
        limiter: config.max_tps.map(rate_limiter),
    });
    Router::new()
        .route("/api/auth", post(auth))
        .route("/api/info", get(info))
        .route("/api/sendCoin", post(send_coin))
        .route("/api/buy/:item", get(buy))
        .with_state(state)
}

#[derive(Deserialize)]
struct AuthRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
}

#[derive(Serialize)]
struct InfoResponse {
    coins: i64,
}

#[derive(Deserialize)]
struct SendCoinRequest {
    #[serde(rename = "toUser")]
    to_user: String,
    amount: i64,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "Errors")]
    errors: String,
}

#[derive(Serialize)]
struct MessageBody {
    #[serde(rename = "Message")]
    message: String,
}

type Reject = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, errors: &str) -> Reject {
    (
        status,
        Json(ErrorBody {
            errors: errors.to_string(),
        }),
    )
}

#[debug_handler]
async fn auth(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, Reject> {
    admit(&state)?;
    if req.username.is_empty() || req.password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "bad request"));
    }
    debug!(username = %req.username, "issuing token");
    Ok(Json(AuthResponse {
        token: format!("{TOKEN_PREFIX}{}", req.username),
    }))
}

#[debug_handler]
async fn info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<InfoResponse>, Reject> {
    admit(&state)?;
    authorize(&headers)?;
    Ok(Json(InfoResponse { coins: 1000 }))
}

#[debug_handler]
async fn send_coin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SendCoinRequest>,
) -> Result<Json<MessageBody>, Reject> {
    admit(&state)?;
    authorize(&headers)?;
    if req.amount < 0 {
        return Err(reject(StatusCode::BAD_REQUEST, "negative amount"));
    }
    debug!(to_user = %req.to_user, amount = req.amount, "coins sent");
    Ok(Json(MessageBody {
        message: "coins sent".to_string(),
    }))
}

#[debug_handler]
async fn buy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(item): Path<String>,
) -> Result<Json<MessageBody>, Reject> {
    admit(&state)?;
    authorize(&headers)?;
    debug!(%item, "item bought");
    Ok(Json(MessageBody {
        message: format!("{item} bought"),
    }))
}

/// Counts the request and applies the optional TPS cap.
fn admit(state: &AppState) -> Result<(), Reject> {
    counter!("mock_shop.requests").increment(1);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "over capacity"));
        }
    }
    Ok(())
}

fn authorize(headers: &HeaderMap) -> Result<(), Reject> {
    match bearer(headers) {
        Some(token) if token.starts_with(TOKEN_PREFIX) => Ok(()),
        _ => Err(reject(StatusCode::UNAUTHORIZED, "unauthorized")),
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn rate_limiter(tps: u32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(
        NonZeroU32::new(tps.max(1)).unwrap_or(NonZeroU32::MIN),
    ))
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = TPS_MEASURE.fetch_min(0, Ordering::Relaxed);
        println!("{requests} TPS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer mock-testuser0".parse().unwrap());
        assert_eq!(bearer(&headers), Some("mock-testuser0"));
        assert!(authorize(&headers).is_ok());

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(authorize(&headers).is_err());
    }
}
