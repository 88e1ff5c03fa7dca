//! Request-scoped authentication context
//!
//! `authenticate` writes an [`AuthContext`] into the request extensions
//! exactly once; handlers read it back through the extractors below.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthError;

/// Who is making the request
#[derive(Debug, Clone)]
pub enum AuthContext {
    Anonymous,
    User(Arc<User>),
}

impl AuthContext {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::User(user) => Some(user),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }

    /// Read the context; panics if `authenticate` did not run
    pub fn from_parts(parts: &Parts) -> Self {
        match parts.extensions.get::<AuthContext>() {
            Some(context) => context.clone(),
            None => panic!("AuthContext missing: the authenticate middleware is not installed"),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext::from_parts(parts))
    }
}

/// An authenticated caller (401 when anonymous)
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match AuthContext::from_parts(parts) {
            AuthContext::User(user) => Ok(CurrentUser(user)),
            AuthContext::Anonymous => Err(AuthError::AuthenticationRequired),
        }
    }
}

/// An authenticated caller whose account is activated (403 otherwise)
#[derive(Debug, Clone)]
pub struct ActivatedUser(pub Arc<User>);

impl<S: Send + Sync> FromRequestParts<S> for ActivatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AuthError::InactiveAccount);
        }
        Ok(ActivatedUser(user))
    }
}

/// What a route demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Activated,
    /// Implies `Activated`
    Permission(&'static str),
    /// Implies `Activated`; `admin` satisfies every role
    Role(UserRole),
}
