//! Authenticate Use Case
//!
//! Resolves a presented bearer token to its owner.

use std::sync::Arc;

use platform::crypto;

use crate::domain::entity::{token::hash_plaintext, user::User};
use crate::domain::repository::TokenRepository;
use crate::domain::value_object::token_scope::TokenScope;
use crate::error::{AuthError, AuthResult};

/// Authenticate use case
pub struct AuthenticateUseCase<R>
where
    R: TokenRepository,
{
    repo: Arc<R>,
}

impl<R> AuthenticateUseCase<R>
where
    R: TokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `InvalidAuthToken` for malformed, unknown and expired tokens alike
    pub async fn execute(&self, plaintext: &str) -> AuthResult<User> {
        if !crypto::is_token_shaped(plaintext) {
            return Err(AuthError::InvalidAuthToken);
        }

        self.repo
            .get_user_for_token(TokenScope::Authentication, &hash_plaintext(plaintext))
            .await?
            .ok_or(AuthError::InvalidAuthToken)
    }
}
