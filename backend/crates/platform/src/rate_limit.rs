//! Rate Limiting Infrastructure
//!
//! Per-client token bucket: each key refills at `rps` tokens per second up
//! to `burst`, and a request spends one token.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub rps: f64,
    /// Bucket capacity
    pub burst: u32,
    pub enabled: bool,
    /// Buckets untouched for this long are dropped by [`InMemoryRateLimiter::purge_idle`]
    pub idle_ttl: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: 2.0,
            burst: 4,
            enabled: true,
            idle_ttl: Duration::from_secs(3 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(rps: f64, burst: u32) -> Self {
        Self {
            rps,
            burst,
            ..Self::default()
        }
    }

    /// Generous limits for local work
    pub fn development() -> Self {
        Self::new(50.0, 100)
    }

    pub fn idle_ttl_ms(&self) -> i64 {
        self.idle_ttl.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the next token is available (zero when allowed)
    pub retry_after: Duration,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Spend one token for `key` if one is available
    async fn check_and_increment(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult;
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

/// Process-local limiter keyed by client address
#[derive(Debug, Default)]
pub struct InMemoryRateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous core of [`RateLimitStore::check_and_increment`]
    pub fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now = Instant::now();
        let burst = f64::from(config.burst);

        let mut bucket = self.buckets.entry(key.to_owned()).or_insert(Bucket {
            tokens: burst,
            last_seen: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * config.rps).min(burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateLimitResult {
                allowed: true,
                remaining: bucket.tokens.floor() as u32,
                retry_after: Duration::ZERO,
            }
        } else {
            let missing = 1.0 - bucket.tokens;
            let retry_after = if config.rps > 0.0 {
                Duration::from_secs_f64(missing / config.rps)
            } else {
                Duration::MAX
            };
            RateLimitResult {
                allowed: false,
                remaining: 0,
                retry_after,
            }
        }
    }

    /// Drop buckets not seen within `idle_ttl`; returns how many were removed
    pub fn purge_idle(&self, idle_ttl: Duration) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_seen) < idle_ttl);
        before - self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    async fn check_and_increment(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.check(key, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject() {
        let limiter = InMemoryRateLimiter::new();
        let config = RateLimitConfig::default();

        for _ in 0..4 {
            assert!(
                RateLimitStore::check_and_increment(&limiter, "10.0.0.1", &config)
                    .await
                    .allowed
            );
        }
        let denied = RateLimitStore::check_and_increment(&limiter, "10.0.0.1", &config).await;
        assert!(!denied.allowed);
        assert!(denied.retry_after > Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_over_time() {
        let limiter = InMemoryRateLimiter::new();
        let config = RateLimitConfig::default();

        for _ in 0..4 {
            limiter.check("10.0.0.1", &config);
        }
        assert!(!limiter.check("10.0.0.1", &config).allowed);

        // 2 rps: half a second buys one request
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(limiter.check("10.0.0.1", &config).allowed);
        assert!(!limiter.check("10.0.0.1", &config).allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = InMemoryRateLimiter::new();
        let config = RateLimitConfig::new(1.0, 1);

        assert!(limiter.check("a", &config).allowed);
        assert!(!limiter.check("a", &config).allowed);
        assert!(limiter.check("b", &config).allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_idle() {
        let limiter = InMemoryRateLimiter::new();
        let config = RateLimitConfig::default();
        limiter.check("a", &config);
        tokio::time::advance(Duration::from_secs(120)).await;
        limiter.check("b", &config);
        tokio::time::advance(Duration::from_secs(90)).await;

        assert_eq!(limiter.purge_idle(config.idle_ttl), 1);
        assert_eq!(limiter.len(), 1);
    }
}
