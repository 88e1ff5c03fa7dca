//! Administration Use Cases
//!
//! Role changes and permission grants. Both are reachable only behind the
//! `admin` role gate.

use std::sync::Arc;

use kernel::id::UserId;
use kernel::validation::{Validator, unique};

use crate::application::finish;
use crate::domain::entity::user::User;
use crate::domain::repository::{PermissionRepository, UserRepository};
use crate::domain::value_object::{permission::Permissions, user_role::UserRole};
use crate::error::AuthResult;

/// Change role use case
pub struct SetRoleUseCase<R>
where
    R: UserRepository + PermissionRepository,
{
    repo: Arc<R>,
}

impl<R> SetRoleUseCase<R>
where
    R: UserRepository + PermissionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Role is not versioned; the user's `version` is left alone
    pub async fn execute(&self, user_id: UserId, role: &str) -> AuthResult<User> {
        let mut v = Validator::new();
        let parsed = role
            .parse::<UserRole>()
            .map_err(|_| v.add_error("role", "must be one of user, admin"))
            .ok();
        finish(v)?;

        let mut user = self.repo.get(user_id).await?;
        if let Some(role) = parsed {
            self.repo.change_role_for_user(user.id, role).await?;
            user.role = role;
        }

        tracing::info!(user_id = %user.id, role = %user.role, "Role changed");
        Ok(user)
    }
}

/// Grant permissions use case
pub struct GrantPermissionsUseCase<R>
where
    R: UserRepository + PermissionRepository,
{
    repo: Arc<R>,
}

impl<R> GrantPermissionsUseCase<R>
where
    R: UserRepository + PermissionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns the full set held after the grant
    pub async fn execute(&self, user_id: UserId, codes: Vec<String>) -> AuthResult<Permissions> {
        let mut v = Validator::new();
        v.check(!codes.is_empty(), "permissions", "must contain at least 1 code");
        v.check(
            codes.iter().all(|c| !c.trim().is_empty()),
            "permissions",
            "must not contain empty codes",
        );
        v.check(unique(&codes), "permissions", "must not contain duplicate values");
        finish(v)?;

        let user = self.repo.get(user_id).await?;
        self.repo.add_for_user(user.id, &codes).await?;
        let held = self.repo.get_all_for_user(user.id).await?;

        tracing::info!(user_id = %user.id, granted = codes.len(), "Permissions granted");
        Ok(held)
    }
}
