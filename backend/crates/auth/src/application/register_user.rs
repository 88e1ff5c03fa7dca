//! Register User Use Case
//!
//! Creates an inactive account, grants the default role and permissions,
//! and mails an activation token in the background.

use std::sync::Arc;

use kernel::validation::Validator;
use platform::background::BackgroundTasks;

use crate::application::config::AuthConfig;
use crate::application::mailer::{Mailer, OutgoingMail};
use crate::domain::entity::user::{User, validate_name};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterUserInput {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

/// Register user use case
pub struct RegisterUserUseCase<R, M>
where
    R: UserRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    tasks: BackgroundTasks,
    config: Arc<AuthConfig>,
}

impl<R, M> RegisterUserUseCase<R, M>
where
    R: UserRepository,
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

    pub async fn execute(&self, input: RegisterUserInput) -> AuthResult<User> {
        let mut v = Validator::new();
        validate_name(&mut v, "name", &input.name);
        validate_name(&mut v, "surname", &input.surname);

        let (email, password) = match (Email::new(&input.email), RawPassword::new(input.password)) {
            (Ok(email), Ok(password)) if v.valid() => (email, password),
            (email, password) => {
                if let Err(e) = email {
                    v.add_error("email", e.to_string());
                }
                if let Err(e) = password {
                    v.add_error("password", e.to_string());
                }
                return Err(AuthError::Validation(v.errors().clone()));
            }
        };

        // Hash only once every cheap check has passed
        let hash = UserPassword::from_raw(&password, self.config.pepper())?;
        let mut user = User::new(input.name, input.surname, email, hash);

        user.role = UserRole::User;
        let token = self
            .repo
            .register(
                &mut user,
                &self.config.default_permissions,
                self.config.activation_ttl,
            )
            .await?;

        let mail = OutgoingMail::welcome(&user.email, &user.name, user.id, &token.plaintext);
        let mailer = self.mailer.clone();
        self.tasks
            .spawn("welcome_mail", async move { mailer.send(mail).await });

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }
}
