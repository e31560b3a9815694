//! Request middleware: request ids, bearer-token auth, and per-project rate
//! limiting.
//!
//! Rejections reuse the API error envelope from [`crate::api`] so dashboard
//! clients parse one error shape everywhere, request id included.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id carried through extensions and echoed in every envelope.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The bearer-token set guarding the analytics routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Arc<HashSet<String>>,
}

impl AuthState {
    /// Auth over an explicit token set. An empty set disables enforcement.
    #[must_use]
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            keys: Arc::new(keys.into_iter().collect()),
        }
    }

    /// Auth from `PROMPTWATCH_API_KEYS` (comma-separated bearer tokens).
    ///
    /// Development tolerates a missing value and runs open; any other
    /// environment refuses to start without at least one token.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("PROMPTWATCH_API_KEYS").unwrap_or_default();
        let state = Self::from_keys(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned),
        );

        if !state.enabled() {
            if !is_development {
                anyhow::bail!(
                    "PROMPTWATCH_API_KEYS must list at least one bearer token outside development"
                );
            }
            tracing::warn!("PROMPTWATCH_API_KEYS not set; bearer auth disabled for development");
        }

        Ok(state)
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    fn allows(&self, token: &str) -> bool {
        self.keys.contains(token)
    }
}

/// A rate-limit bucket. Analytics traffic is dominated by per-project
/// dashboard polling, so each project gets its own window and one project's
/// refresh storm cannot starve another's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RateKey {
    Project(i64),
    Shared,
}

/// Project-scoped paths look like `/api/v1/projects/{id}/...`; everything
/// else shares one bucket.
fn rate_key(path: &str) -> RateKey {
    let mut parts = path.split('/').filter(|s| !s.is_empty());
    if let (Some("api"), Some("v1"), Some("projects"), Some(id)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    {
        if let Ok(id) = id.parse::<i64>() {
            return RateKey::Project(id);
        }
    }
    RateKey::Shared
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    count: u32,
}

/// Fixed-window request limiter, one window per [`RateKey`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<RateKey, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request against `key`, returning false once the window is
    /// full. Expired windows are pruned on every call so idle projects do
    /// not accumulate.
    async fn try_acquire(&self, key: RateKey) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        windows.retain(|_, w| now.duration_since(w.opened_at) < self.window);

        let window = windows.entry(key).or_insert(Window {
            opened_at: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Reads `x-request-id` off the request or mints a v4 uuid, stores it as a
/// [`RequestId`] extension, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Middleware enforcing bearer-token auth when a token set is configured.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled() {
        return next.run(req).await;
    }

    let authorized = bearer_token(&req).is_some_and(|token| auth.allows(token));
    if authorized {
        next.run(req).await
    } else {
        reject(&req, "unauthorized", "missing or invalid bearer token")
    }
}

/// Middleware enforcing the per-project fixed-window limit.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let key = rate_key(req.uri().path());
    if limiter.try_acquire(key).await {
        next.run(req).await
    } else {
        reject(&req, "rate_limited", "rate limit exceeded for this project")
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The `request_id` layer runs outermost, so the extension is present by the
/// time auth and rate limiting reject.
fn reject(req: &Request, code: &str, message: &str) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |r| r.0.clone());
    ApiError::new(request_id, code, message).into_response()
}
