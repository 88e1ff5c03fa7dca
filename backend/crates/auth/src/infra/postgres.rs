//! PostgreSQL Repository Implementations
//!
//! `users` goes through the shared versioned store; tokens and permission
//! grants are plain queries run under the same deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::{UserId, markers};
use kernel::pagination::SortField;
use platform::store::{PgStore, StoreError, Versioned};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Row};

use crate::domain::entity::{token::Token, user::User};
use crate::domain::repository::{PermissionRepository, TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, permission::Permissions, token_scope::TokenScope,
    user_password::UserPassword, user_role::UserRole,
};
use crate::error::AuthResult;

// ============================================================================
// Row mapping
// ============================================================================

impl Versioned for User {
    type Marker = markers::User;
    type Filter = ();

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["name", "surname", "email", "password_hash", "activated", "role"];
    const SELECT: &'static str =
        "id, created_at, name, surname, email, password_hash, activated, role, version";
    const SORT_SAFELIST: &'static [SortField] = &[SortField::new("id", "id")];

    fn id(&self) -> UserId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn stamp(&mut self, id: UserId, created_at: DateTime<Utc>, version: i32) {
        self.id = id;
        self.created_at = created_at;
        self.version = version;
    }

    fn push_values(&self, sep: &mut Separated<'_, '_, Postgres, &'static str>) {
        sep.push_bind(self.name.clone());
        sep.push_bind(self.surname.clone());
        sep.push_bind(self.email.as_str().to_string());
        sep.push_bind(self.password.as_phc_string().to_string());
        sep.push_bind(self.activated);
        sep.push_bind(self.role.code());
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let password_hash: String = row.try_get("password_hash")?;
        let role: String = row.try_get("role")?;

        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            name: row.try_get("name")?,
            surname: row.try_get("surname")?,
            email: Email::from_db(row.try_get::<String, _>("email")?),
            password: UserPassword::from_phc_string(password_hash).map_err(|e| {
                sqlx::Error::ColumnDecode {
                    index: "password_hash".into(),
                    source: Box::new(e),
                }
            })?,
            activated: row.try_get("activated")?,
            role: role.parse::<UserRole>().map_err(|e| sqlx::Error::ColumnDecode {
                index: "role".into(),
                source: Box::new(e),
            })?,
            version: row.try_get("version")?,
        })
    }
}

// ============================================================================
// Repository
// ============================================================================

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    users: PgStore<User>,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            users: PgStore::new(pool, query_timeout),
        }
    }

    fn pool(&self) -> &PgPool {
        self.users.pool()
    }
}

impl UserRepository for PgAuthRepository {
    async fn insert(&self, user: &mut User) -> AuthResult<()> {
        Ok(self.users.insert(user).await?)
    }

    async fn register(
        &self,
        user: &mut User,
        permissions: &[String],
        activation_ttl: Duration,
    ) -> AuthResult<Token> {
        let token = self
            .users
            .bounded(async {
                let mut tx = self.pool().begin().await?;

                self.users.insert_in(&mut tx, user).await?;
                grant_permissions(&mut tx, user.id, permissions).await?;
                let token = Token::generate(user.id, activation_ttl, TokenScope::Activation);
                insert_token(&mut tx, &token).await?;

                tx.commit().await?;
                Ok::<_, StoreError>(token)
            })
            .await?;
        Ok(token)
    }

    async fn get(&self, id: UserId) -> AuthResult<User> {
        Ok(self.users.get(id).await?)
    }

    async fn get_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let user = self
            .users
            .bounded(async {
                let sql = format!("SELECT {} FROM users WHERE email = $1", User::SELECT);
                Ok(sqlx::query_as::<_, User>(&sql)
                    .bind(email.as_str())
                    .fetch_optional(self.pool())
                    .await?)
            })
            .await?;
        Ok(user)
    }

    async fn update(&self, user: &mut User) -> AuthResult<()> {
        Ok(self.users.update(user).await?)
    }

    async fn delete(&self, id: UserId) -> AuthResult<()> {
        Ok(self.users.delete(id).await?)
    }
}

impl TokenRepository for PgAuthRepository {
    async fn insert(&self, token: &Token) -> AuthResult<()> {
        self.users
            .bounded(async {
                let mut conn = self.pool().acquire().await?;
                insert_token(&mut conn, token).await
            })
            .await?;
        Ok(())
    }

    async fn get_user_for_token(
        &self,
        scope: TokenScope,
        hash: &[u8; 32],
    ) -> AuthResult<Option<User>> {
        let user = self
            .users
            .bounded(async {
                Ok(sqlx::query_as::<_, User>(
                    r#"
                    SELECT users.id, users.created_at, users.name, users.surname, users.email,
                           users.password_hash, users.activated, users.role, users.version
                    FROM users
                    INNER JOIN tokens ON users.id = tokens.user_id
                    WHERE tokens.hash = $1
                      AND tokens.scope = $2
                      AND tokens.expiry > $3
                    "#,
                )
                .bind(&hash[..])
                .bind(scope.code())
                .bind(Utc::now())
                .fetch_optional(self.pool())
                .await?)
            })
            .await?;
        Ok(user)
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: UserId) -> AuthResult<u64> {
        let deleted = self
            .users
            .bounded(async {
                Ok(sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                    .bind(scope.code())
                    .bind(user_id)
                    .execute(self.pool())
                    .await?
                    .rows_affected())
            })
            .await?;
        Ok(deleted)
    }

    async fn delete_expired(&self) -> AuthResult<u64> {
        let deleted = self
            .users
            .bounded(async {
                Ok(sqlx::query("DELETE FROM tokens WHERE expiry <= $1")
                    .bind(Utc::now())
                    .execute(self.pool())
                    .await?
                    .rows_affected())
            })
            .await?;

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired tokens");
        Ok(deleted)
    }
}

impl PermissionRepository for PgAuthRepository {
    async fn get_all_for_user(&self, user_id: UserId) -> AuthResult<Permissions> {
        let codes = self
            .users
            .bounded(async {
                Ok(sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT permissions.code
                    FROM permissions
                    INNER JOIN users_permissions
                        ON users_permissions.permission_id = permissions.id
                    WHERE users_permissions.user_id = $1
                    "#,
                )
                .bind(user_id)
                .fetch_all(self.pool())
                .await?)
            })
            .await?;
        Ok(codes.into_iter().collect())
    }

    async fn add_for_user(&self, user_id: UserId, codes: &[String]) -> AuthResult<()> {
        self.users
            .bounded(async {
                let mut conn = self.pool().acquire().await?;
                grant_permissions(&mut conn, user_id, codes).await
            })
            .await?;
        Ok(())
    }

    async fn change_role_for_user(&self, user_id: UserId, role: UserRole) -> AuthResult<()> {
        let affected = self
            .users
            .bounded(async {
                Ok(sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
                    .bind(role.code())
                    .bind(user_id)
                    .execute(self.pool())
                    .await?
                    .rows_affected())
            })
            .await?;

        if affected == 0 {
            return Err(StoreError::NotFound.into());
        }
        Ok(())
    }
}

// ============================================================================
// Shared statements
// ============================================================================

async fn insert_token(conn: &mut PgConnection, token: &Token) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO tokens (hash, user_id, expiry, scope)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(&token.hash[..])
    .bind(token.user_id)
    .bind(token.expiry)
    .bind(token.scope.code())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Unknown codes match no `permissions` row and are skipped
async fn grant_permissions(
    conn: &mut PgConnection,
    user_id: UserId,
    codes: &[String],
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO users_permissions (user_id, permission_id)
        SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(codes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
