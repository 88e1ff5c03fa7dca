//! Account Use Cases
//!
//! The authenticated caller reading, editing or removing their own account.

use std::sync::Arc;

use kernel::id::UserId;
use kernel::validation::Validator;

use crate::application::config::AuthConfig;
use crate::application::finish;
use crate::domain::entity::user::{User, validate_name};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    token_scope::TokenScope,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Update
// ============================================================================

/// Partial update; absent fields keep their value
#[derive(Debug, Default)]
pub struct UpdateAccountInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Optimistic precondition from `X-Expected-Version`
    pub expected_version: Option<i32>,
}

/// Update own account use case
pub struct UpdateAccountUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> UpdateAccountUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, user_id: UserId, input: UpdateAccountInput) -> AuthResult<User> {
        let mut user = self.repo.get(user_id).await?;

        if input
            .expected_version
            .is_some_and(|expected| expected != user.version)
        {
            return Err(AuthError::EditConflict);
        }

        let mut v = Validator::new();
        if let Some(name) = input.name {
            validate_name(&mut v, "name", &name);
            user.name = name;
        }
        if let Some(surname) = input.surname {
            validate_name(&mut v, "surname", &surname);
            user.surname = surname;
        }
        if let Some(raw) = input.email {
            match Email::new(&raw) {
                Ok(email) => user.email = email,
                Err(e) => v.add_error("email", e.to_string()),
            }
        }
        let password = match input.password.map(RawPassword::new) {
            Some(Ok(password)) => Some(password),
            Some(Err(e)) => {
                v.add_error("password", e.to_string());
                None
            }
            None => None,
        };
        finish(v)?;

        let password_changed = password.is_some();
        if let Some(password) = password {
            user.password = UserPassword::from_raw(&password, self.config.pepper())?;
        }

        UserRepository::update(&*self.repo, &mut user).await?;

        if password_changed {
            let revoked = self
                .repo
                .delete_all_for_user(TokenScope::Authentication, user.id)
                .await?;
            tracing::info!(user_id = %user.id, revoked, "Password changed, tokens revoked");
        }

        tracing::info!(user_id = %user.id, version = user.version, "Account updated");
        Ok(user)
    }
}

// ============================================================================
// Delete
// ============================================================================

/// Delete own account use case
pub struct DeleteAccountUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> DeleteAccountUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Tokens and grants go with the row (`ON DELETE CASCADE`)
    pub async fn execute(&self, user_id: UserId) -> AuthResult<()> {
        self.repo.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}
