//! Per-client rate limiting

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use platform::client::extract_client_ip;
use platform::rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimitStore};

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<InMemoryRateLimiter>,
    pub config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: Arc::new(InMemoryRateLimiter::new()),
            config,
        }
    }
}

/// Spend one token for the client, or answer 429 with `Retry-After`
pub async fn rate_limit(State(state): State<RateLimitState>, req: Request, next: Next) -> Response {
    if !state.config.enabled {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = extract_client_ip(req.headers(), peer)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let result = state.limiter.check_and_increment(&key, &state.config).await;
    if result.allowed {
        return next.run(req).await;
    }

    tracing::warn!(client = %key, "Rate limit exceeded");
    let mut response = AppError::too_many_requests("rate limit exceeded").into_response();
    let retry_after = result.retry_after.as_secs().max(1);
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
