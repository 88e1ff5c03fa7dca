//! Sign Out Use Case
//!
//! Revokes every authentication token of the caller.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::repository::TokenRepository;
use crate::domain::value_object::token_scope::TokenScope;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: TokenRepository,
{
    repo: Arc<R>,
}

impl<R> SignOutUseCase<R>
where
    R: TokenRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId) -> AuthResult<u64> {
        let revoked = self
            .repo
            .delete_all_for_user(TokenScope::Authentication, user_id)
            .await?;

        tracing::info!(user_id = %user_id, revoked, "User signed out");
        Ok(revoked)
    }
}
