//! Auth (Authentication / Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and the mailer port
//! - `infra/` - PostgreSQL repositories, file mailer
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration with a mailed, single-use activation token
//! - Bearer authentication tokens (24h) resolved once per request
//! - Permission codes (`movies:read`, `movies:write`) and roles (`user`, `admin`)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional application pepper
//! - Tokens are 32 random bytes; only their SHA-256 is stored
//! - Authorization is default-deny

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{mailer::FileMailer, postgres::PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::context::{
        ActivatedUser, AuthContext, CurrentUser, Requirement,
    };
    pub use crate::presentation::middleware::*;
}
