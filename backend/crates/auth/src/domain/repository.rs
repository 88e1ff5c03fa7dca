//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use std::time::Duration;

use kernel::id::UserId;

use crate::domain::entity::{token::Token, user::User};
use crate::domain::value_object::{
    email::Email, permission::Permissions, token_scope::TokenScope, user_role::UserRole,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert, writing id/created_at/version back (`DuplicateEmail` on clash)
    async fn insert(&self, user: &mut User) -> AuthResult<()>;

    /// Insert a new account with its grants and first activation token, all or nothing
    async fn register(
        &self,
        user: &mut User,
        permissions: &[String],
        activation_ttl: Duration,
    ) -> AuthResult<Token>;

    /// `UserNotFound` when absent
    async fn get(&self, id: UserId) -> AuthResult<User>;

    async fn get_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Version-gated; `EditConflict` when `user.version` is stale
    async fn update(&self, user: &mut User) -> AuthResult<()>;

    async fn delete(&self, id: UserId) -> AuthResult<()>;
}

/// Token repository trait
#[trait_variant::make(TokenRepository: Send)]
pub trait LocalTokenRepository {
    /// Stores the hash only
    async fn insert(&self, token: &Token) -> AuthResult<()>;

    /// Owner of an unexpired token with this hash and scope
    async fn get_user_for_token(
        &self,
        scope: TokenScope,
        hash: &[u8; 32],
    ) -> AuthResult<Option<User>>;

    /// Idempotent
    async fn delete_all_for_user(&self, scope: TokenScope, user_id: UserId) -> AuthResult<u64>;

    async fn delete_expired(&self) -> AuthResult<u64>;
}

/// Permission / role repository trait
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    /// Empty when nothing was granted
    async fn get_all_for_user(&self, user_id: UserId) -> AuthResult<Permissions>;

    /// Idempotent; unknown codes are ignored
    async fn add_for_user(&self, user_id: UserId, codes: &[String]) -> AuthResult<()>;

    async fn change_role_for_user(&self, user_id: UserId, role: UserRole) -> AuthResult<()>;
}

/// Every repository the auth handlers need, behind one bound
pub trait AuthRepository:
    UserRepository + TokenRepository + PermissionRepository + Send + Sync + 'static
{
}

impl<T> AuthRepository for T where
    T: UserRepository + TokenRepository + PermissionRepository + Send + Sync + 'static
{
}
