//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod activate_user;
pub mod admin;
pub mod authenticate;
pub mod config;
pub mod create_activation_token;
pub mod create_auth_token;
pub mod mailer;
pub mod register_user;
pub mod sign_out;

use kernel::validation::Validator;

use crate::error::{AuthError, AuthResult};

// Re-exports
pub use account::{DeleteAccountUseCase, UpdateAccountInput, UpdateAccountUseCase};
pub use activate_user::ActivateUserUseCase;
pub use admin::{GrantPermissionsUseCase, SetRoleUseCase};
pub use authenticate::AuthenticateUseCase;
pub use config::AuthConfig;
pub use create_activation_token::CreateActivationTokenUseCase;
pub use create_auth_token::{CreateAuthTokenUseCase, CredentialsInput};
pub use mailer::{MailError, Mailer, OutgoingMail};
pub use register_user::{RegisterUserInput, RegisterUserUseCase};
pub use sign_out::SignOutUseCase;

/// 422 carrying every recorded field error
pub(crate) fn finish(v: Validator) -> AuthResult<()> {
    if v.valid() {
        Ok(())
    } else {
        Err(AuthError::Validation(v.errors().clone()))
    }
}
