//! Server configuration
//!
//! Read once at startup from the process environment (after `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use platform::background::BackgroundConfig;
use platform::db::DbConfig;
use platform::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    /// `development`, `staging` or `production`
    pub env: String,
    pub db: DbConfig,
    pub limiter: RateLimitConfig,
    pub background: BackgroundConfig,
    pub mail_dir: PathBuf,
    pub mail_sender: String,
    pub frontend_origins: Vec<String>,
    pub password_pepper: Option<String>,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = get("APP_ENV").unwrap_or_else(|| "development".to_string());
        if !matches!(env.as_str(), "development" | "staging" | "production") {
            bail!("APP_ENV must be one of development, staging, production (got {env:?})");
        }

        let url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let defaults = DbConfig::default();
        let db = DbConfig {
            url,
            max_open_conns: parse_or(&get, "DB_MAX_OPEN_CONNS", defaults.max_open_conns)?,
            max_idle_conns: parse_or(&get, "DB_MAX_IDLE_CONNS", defaults.max_idle_conns)?,
            max_idle_time: duration_or(&get, "DB_MAX_IDLE_TIME", defaults.max_idle_time)?,
            query_timeout: duration_or(&get, "DB_QUERY_TIMEOUT", defaults.query_timeout)?,
        };

        let defaults = RateLimitConfig::default();
        let limiter = RateLimitConfig {
            rps: parse_or(&get, "LIMITER_RPS", defaults.rps)?,
            burst: parse_or(&get, "LIMITER_BURST", defaults.burst)?,
            enabled: parse_or(&get, "LIMITER_ENABLED", defaults.enabled)?,
            ..defaults
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be text or json (got {other:?})"),
        };

        Ok(Self {
            port: parse_or(&get, "PORT", 4000)?,
            env,
            db,
            limiter,
            background: BackgroundConfig::default(),
            mail_dir: get("MAIL_DIR").map(PathBuf::from).unwrap_or_else(|| "./mail".into()),
            mail_sender: get("MAIL_SENDER")
                .unwrap_or_else(|| "Greenlight <no-reply@greenlight.local>".to_string()),
            frontend_origins: get("FRONTEND_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            password_pepper: get("PASSWORD_PEPPER"),
            log_format,
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
    }
}

/// `15m`, `3s`, `500ms`
fn duration_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    match get(key) {
        None => Ok(default),
        Some(raw) => humantime::parse_duration(raw.trim())
            .with_context(|| format!("{key} is not a duration: {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/greenlight")]).unwrap();
        assert_eq!(config.port, 4000);
        assert!(config.is_development());
        assert_eq!(config.db.max_open_conns, 25);
        assert_eq!(config.db.max_idle_time, Duration::from_secs(900));
        assert_eq!(config.db.query_timeout, Duration::from_secs(3));
        assert_eq!(config.limiter.rps, 2.0);
        assert_eq!(config.limiter.burst, 4);
        assert!(config.limiter.enabled);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.frontend_origins.is_empty());
        assert!(config.password_pepper.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/greenlight"),
            ("PORT", "8080"),
            ("APP_ENV", "production"),
            ("DB_MAX_IDLE_TIME", "5m"),
            ("DB_QUERY_TIMEOUT", "750ms"),
            ("LIMITER_ENABLED", "false"),
            ("FRONTEND_ORIGINS", "http://a.test, http://b.test"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.is_development());
        assert_eq!(config.db.max_idle_time, Duration::from_secs(300));
        assert_eq!(config.db.query_timeout, Duration::from_millis(750));
        assert!(!config.limiter.enabled);
        assert_eq!(config.frontend_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(config(&[]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("DB_QUERY_TIMEOUT", "soon")]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("APP_ENV", "qa")]).is_err());
    }
}
