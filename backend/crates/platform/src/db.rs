//! Database pool and per-operation deadlines

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Startup connect/ping deadline
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing and query deadline
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub max_idle_time: Duration,
    /// Deadline applied to every store operation
    pub query_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_open_conns: 25,
            max_idle_conns: 25,
            max_idle_time: Duration::from_secs(15 * 60),
            query_timeout: Duration::from_secs(3),
        }
    }
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn development(url: impl Into<String>) -> Self {
        Self {
            max_open_conns: 5,
            max_idle_conns: 2,
            ..Self::new(url)
        }
    }

    /// Idle connections kept warm; never above the open limit
    pub fn min_connections(&self) -> u32 {
        self.max_idle_conns.min(self.max_open_conns)
    }

    pub fn query_timeout_ms(&self) -> i64 {
        self.query_timeout.as_millis() as i64
    }
}

/// Open the pool and make sure the server answers within [`CONNECT_TIMEOUT`]
pub async fn connect(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.min_connections())
        .idle_timeout(config.max_idle_time)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_open_conns,
        min_connections = config.min_connections(),
        idle_timeout_ms = config.max_idle_time.as_millis() as u64,
        "Connected to database"
    );

    Ok(pool)
}

/// Raised when an operation outlives its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation exceeded its {limit:?} deadline")]
pub struct DeadlineExceeded {
    pub limit: Duration,
}

/// Run `fut` under `limit`; the deadline maps into the caller's error type
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use std::time::Duration;
/// use platform::db::{within, DeadlineExceeded};
///
/// let fast: Result<u8, DeadlineExceeded> =
///     within(Duration::from_secs(1), async { Ok(7) }).await;
/// assert_eq!(fast, Ok(7));
/// # });
/// ```
pub async fn within<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DeadlineExceeded { limit }.into()),
    }
}
