//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::{token::Token, user::User};
use crate::domain::value_object::permission::Permissions;

// ============================================================================
// Requests
// ============================================================================

/// POST /users
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// PUT /users/activated
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateRequest {
    #[serde(default)]
    pub token: String,
}

/// PATCH /users/me
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// PUT /users/{id}/role
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    #[serde(default)]
    pub role: String,
}

/// POST /users/{id}/permissions
#[derive(Debug, Clone, Deserialize)]
pub struct GrantPermissionsRequest {
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// POST /tokens/authentication
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /tokens/activation
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Public view of a user; the password hash never leaves the server
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub activated: bool,
    pub role: String,
    pub version: i32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.to_string(),
            activated: user.activated,
            role: user.role.to_string(),
            version: user.version,
        }
    }
}

/// `{"user": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

impl From<&User> for UserEnvelope {
    fn from(user: &User) -> Self {
        Self { user: user.into() }
    }
}

/// `{"authentication_token": {"token": ..., "expiry": ...}}`
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationTokenEnvelope {
    pub authentication_token: Token,
}

/// `{"permissions": [...]}`
#[derive(Debug, Clone, Serialize)]
pub struct PermissionsEnvelope {
    pub permissions: Permissions,
}

/// `{"message": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}

impl MessageEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
