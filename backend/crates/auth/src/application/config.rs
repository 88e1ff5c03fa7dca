//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use crate::domain::value_object::permission::MOVIES_READ;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of a mailed activation token (3 days)
    pub activation_ttl: Duration,
    /// Lifetime of a bearer token (24 hours)
    pub authentication_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Granted to every new account
    pub default_permissions: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            activation_ttl: Duration::from_secs(3 * 24 * 3600),
            authentication_ttl: Duration::from_secs(24 * 3600),
            password_pepper: None,
            default_permissions: vec![MOVIES_READ.to_string()],
        }
    }
}

impl AuthConfig {
    /// Create config for development (no pepper)
    pub fn development() -> Self {
        Self::default()
    }

    pub fn with_pepper(mut self, pepper: impl Into<Vec<u8>>) -> Self {
        self.password_pepper = Some(pepper.into());
        self
    }

    pub fn activation_ttl_ms(&self) -> i64 {
        self.activation_ttl.as_millis() as i64
    }

    pub fn authentication_ttl_ms(&self) -> i64 {
        self.authentication_ttl.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.activation_ttl_ms(), 3 * 24 * 3600 * 1000);
        assert_eq!(config.authentication_ttl_ms(), 24 * 3600 * 1000);
        assert!(config.pepper().is_none());
        assert_eq!(config.default_permissions, vec!["movies:read"]);
    }

    #[test]
    fn test_with_pepper() {
        let config = AuthConfig::development().with_pepper("s3cret");
        assert_eq!(config.pepper(), Some(&b"s3cret"[..]));
    }
}
