//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use kernel::extract::{AppJson, ExpectedVersion};
use kernel::id::UserId;
use platform::background::BackgroundTasks;

use crate::application::config::AuthConfig;
use crate::application::mailer::Mailer;
use crate::application::{
    ActivateUserUseCase, CreateActivationTokenUseCase, CreateAuthTokenUseCase, CredentialsInput,
    DeleteAccountUseCase, GrantPermissionsUseCase, RegisterUserInput, RegisterUserUseCase,
    SetRoleUseCase, SignOutUseCase, UpdateAccountInput, UpdateAccountUseCase,
};
use crate::domain::repository::AuthRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::context::{ActivatedUser, CurrentUser};
use crate::presentation::dto::{
    ActivateRequest, AuthenticationTokenEnvelope, CredentialsRequest, EmailRequest,
    GrantPermissionsRequest, MessageEnvelope, PermissionsEnvelope, RegisterRequest,
    SetRoleRequest, UpdateAccountRequest, UserEnvelope,
};

/// Shared state for auth handlers
pub struct AuthAppState<R, M> {
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub tasks: BackgroundTasks,
    pub config: Arc<AuthConfig>,
}

impl<R, M> Clone for AuthAppState<R, M> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            tasks: self.tasks.clone(),
            config: self.config.clone(),
        }
    }
}

fn parse_user_id(raw: &str) -> AuthResult<UserId> {
    raw.parse::<UserId>().map_err(|_| AuthError::UserNotFound)
}

// ============================================================================
// Users
// ============================================================================

/// POST /v1/users
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<UserEnvelope>)>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let use_case = RegisterUserUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.tasks.clone(),
        state.config.clone(),
    );

    let user = use_case
        .execute(RegisterUserInput {
            name: req.name,
            surname: req.surname,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(UserEnvelope::from(&user))))
}

/// PUT /v1/users/activated
pub async fn activate<R, M>(
    State(state): State<AuthAppState<R, M>>,
    AppJson(req): AppJson<ActivateRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let user = ActivateUserUseCase::new(state.repo.clone())
        .execute(&req.token)
        .await?;
    Ok(Json(UserEnvelope::from(&user)))
}

/// GET /v1/users/me
pub async fn show_me(CurrentUser(user): CurrentUser) -> Json<UserEnvelope> {
    Json(UserEnvelope::from(&*user))
}

/// PATCH /v1/users/me
pub async fn update_me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    ActivatedUser(user): ActivatedUser,
    ExpectedVersion(expected_version): ExpectedVersion,
    AppJson(req): AppJson<UpdateAccountRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let use_case = UpdateAccountUseCase::new(state.repo.clone(), state.config.clone());
    let updated = use_case
        .execute(
            user.id,
            UpdateAccountInput {
                name: req.name,
                surname: req.surname,
                email: req.email,
                password: req.password,
                expected_version,
            },
        )
        .await?;
    Ok(Json(UserEnvelope::from(&updated)))
}

/// DELETE /v1/users/me
pub async fn delete_me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
) -> AuthResult<Json<MessageEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    DeleteAccountUseCase::new(state.repo.clone())
        .execute(user.id)
        .await?;
    Ok(Json(MessageEnvelope::new("account successfully deleted")))
}

/// PUT /v1/users/{id}/role
pub async fn set_role<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<SetRoleRequest>,
) -> AuthResult<Json<UserEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let id = parse_user_id(&id)?;
    let user = SetRoleUseCase::new(state.repo.clone())
        .execute(id, &req.role)
        .await?;
    Ok(Json(UserEnvelope::from(&user)))
}

/// POST /v1/users/{id}/permissions
pub async fn grant_permissions<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<GrantPermissionsRequest>,
) -> AuthResult<Json<PermissionsEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let id = parse_user_id(&id)?;
    let permissions = GrantPermissionsUseCase::new(state.repo.clone())
        .execute(id, req.permissions)
        .await?;
    Ok(Json(PermissionsEnvelope { permissions }))
}

// ============================================================================
// Tokens
// ============================================================================

/// POST /v1/tokens/authentication
pub async fn create_authentication_token<R, M>(
    State(state): State<AuthAppState<R, M>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> AuthResult<(StatusCode, Json<AuthenticationTokenEnvelope>)>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let token = CreateAuthTokenUseCase::new(state.repo.clone(), state.config.clone())
        .execute(CredentialsInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticationTokenEnvelope {
            authentication_token: token,
        }),
    ))
}

/// DELETE /v1/tokens/authentication
pub async fn delete_authentication_tokens<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentUser(user): CurrentUser,
) -> AuthResult<Json<MessageEnvelope>>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    SignOutUseCase::new(state.repo.clone())
        .execute(user.id)
        .await?;
    Ok(Json(MessageEnvelope::new("you have been signed out")))
}

/// POST /v1/tokens/activation
pub async fn create_activation_token<R, M>(
    State(state): State<AuthAppState<R, M>>,
    AppJson(req): AppJson<EmailRequest>,
) -> AuthResult<(StatusCode, Json<MessageEnvelope>)>
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    CreateActivationTokenUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.tasks.clone(),
        state.config.clone(),
    )
    .execute(&req.email)
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageEnvelope::new(
            "an email will be sent to you containing activation instructions",
        )),
    ))
}
