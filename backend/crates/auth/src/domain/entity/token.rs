//! Token Entity
//!
//! 平文トークンは生成時に一度だけ返し、DB には SHA-256 ハッシュのみ保存します。

use chrono::{DateTime, SubsecRound, Utc};
use kernel::id::UserId;
use kernel::validation::Validator;
use platform::crypto::{self, TOKEN_LENGTH};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::domain::value_object::token_scope::TokenScope;

/// Issued token
#[derive(Clone, Serialize)]
pub struct Token {
    /// Present only on a freshly generated token
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: [u8; 32],
    #[serde(skip)]
    pub user_id: UserId,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

impl Token {
    /// 32 bytes from the OS RNG, expiring `ttl` from now
    pub fn generate(user_id: UserId, ttl: Duration, scope: TokenScope) -> Self {
        let plaintext = crypto::generate_token();
        let hash = hash_plaintext(&plaintext);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        // Postgres keeps microseconds; never let storage move the expiry later
        let expiry = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .trunc_subsecs(6);

        Self {
            plaintext,
            hash,
            user_id,
            expiry,
            scope,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("plaintext", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Lookup key for a presented token
pub fn hash_plaintext(plaintext: &str) -> [u8; 32] {
    crypto::sha256(plaintext.as_bytes())
}

/// Shape check done before any lookup
pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == TOKEN_LENGTH,
        "token",
        "must be 43 bytes long",
    );
}
