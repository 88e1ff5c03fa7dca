//! Activate User Use Case
//!
//! Redeems a mailed activation token. The token is single use: every
//! activation token of the user is removed once the account is active.

use std::sync::Arc;

use kernel::validation::Validator;

use crate::application::finish;
use crate::domain::entity::{
    token::{hash_plaintext, validate_token_plaintext},
    user::User,
};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::token_scope::TokenScope;
use crate::error::{AuthError, AuthResult};

/// Activate user use case
pub struct ActivateUserUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    repo: Arc<R>,
}

impl<R> ActivateUserUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, plaintext: &str) -> AuthResult<User> {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, plaintext);
        finish(v)?;

        let mut user = self
            .repo
            .get_user_for_token(TokenScope::Activation, &hash_plaintext(plaintext))
            .await?
            .ok_or_else(|| AuthError::field("token", "invalid or expired activation token"))?;

        user.activate();
        self.repo.update(&mut user).await?;

        let removed = self
            .repo
            .delete_all_for_user(TokenScope::Activation, user.id)
            .await?;

        tracing::info!(user_id = %user.id, removed, "User activated");

        Ok(user)
    }
}
