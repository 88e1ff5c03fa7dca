//! Create Authentication Token Use Case
//!
//! Exchanges email + password for a bearer token. Unknown email and wrong
//! password fail identically.

use std::sync::Arc;

use kernel::validation::Validator;

use crate::application::config::AuthConfig;
use crate::application::finish;
use crate::domain::entity::token::Token;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, token_scope::TokenScope, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

/// Credentials input
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

/// Create authentication token use case
pub struct CreateAuthTokenUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> CreateAuthTokenUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: CredentialsInput) -> AuthResult<Token> {
        let mut v = Validator::new();
        let email = Email::new(&input.email)
            .map_err(|e| v.add_error("email", e.to_string()))
            .ok();
        v.check(!input.password.is_empty(), "password", "must be provided");
        finish(v)?;
        let email = email.ok_or(AuthError::InvalidCredentials)?;

        let user = self
            .repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = RawPassword::candidate(input.password);
        if !user.password.matches(&candidate, self.config.pepper())? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = Token::generate(
            user.id,
            self.config.authentication_ttl,
            TokenScope::Authentication,
        );
        TokenRepository::insert(&*self.repo, &token).await?;

        tracing::info!(user_id = %user.id, "Authentication token issued");

        Ok(token)
    }
}
