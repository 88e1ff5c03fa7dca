//! Create Activation Token Use Case
//!
//! Re-sends an activation token to a registered but inactive account.

use std::sync::Arc;

use kernel::validation::Validator;
use platform::background::BackgroundTasks;

use crate::application::config::AuthConfig;
use crate::application::finish;
use crate::application::mailer::{Mailer, OutgoingMail};
use crate::domain::entity::token::Token;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, token_scope::TokenScope};
use crate::error::{AuthError, AuthResult};

/// Create activation token use case
pub struct CreateActivationTokenUseCase<R, M>
where
    R: UserRepository + TokenRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    tasks: BackgroundTasks,
    config: Arc<AuthConfig>,
}

impl<R, M> CreateActivationTokenUseCase<R, M>
where
    R: UserRepository + TokenRepository,
    M: Mailer + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        mailer: Arc<M>,
        tasks: BackgroundTasks,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            mailer,
            tasks,
            config,
        }
    }

    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let mut v = Validator::new();
        let email = Email::new(email)
            .map_err(|e| v.add_error("email", e.to_string()))
            .ok();
        finish(v)?;
        let Some(email) = email else {
            return Err(AuthError::field("email", "must be provided"));
        };

        let user = self
            .repo
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::field("email", "no matching email address found"))?;

        if user.activated {
            return Err(AuthError::field("email", "user has already been activated"));
        }

        let token = Token::generate(user.id, self.config.activation_ttl, TokenScope::Activation);
        TokenRepository::insert(&*self.repo, &token).await?;

        let mail = OutgoingMail::activation(&user.email, &token.plaintext);
        let mailer = self.mailer.clone();
        self.tasks
            .spawn("activation_mail", async move { mailer.send(mail).await });

        tracing::info!(user_id = %user.id, "Activation token re-issued");
        Ok(())
    }
}
