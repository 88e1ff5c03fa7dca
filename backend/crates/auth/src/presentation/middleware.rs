//! Auth Middleware
//!
//! `authenticate` resolves the bearer token once per request; `gate`
//! enforces a [`Requirement`] in front of a router.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::application::AuthenticateUseCase;
use crate::domain::repository::{PermissionRepository, TokenRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::context::{AuthContext, Requirement};

// ============================================================================
// Authenticate
// ============================================================================

/// Middleware state
pub struct AuthMiddlewareState<R> {
    pub repo: Arc<R>,
}

impl<R> Clone for AuthMiddlewareState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R> AuthMiddlewareState<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

/// Attach an [`AuthContext`] to every request
///
/// A missing header is anonymous. A header that is present but malformed,
/// unknown or expired fails the request with 401.
pub async fn authenticate<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: TokenRepository + Send + Sync + 'static,
{
    let context = match bearer_token(req.headers()) {
        Ok(None) => AuthContext::Anonymous,
        Ok(Some(token)) => {
            match AuthenticateUseCase::new(state.repo.clone())
                .execute(&token)
                .await
            {
                Ok(user) => AuthContext::User(Arc::new(user)),
                Err(e) => return vary_on_authorization(e.into_response()),
            }
        }
        Err(e) => return vary_on_authorization(e.into_response()),
    };

    req.extensions_mut().insert(context);
    vary_on_authorization(next.run(req).await)
}

/// `Ok(None)` when there is no `Authorization` header at all
fn bearer_token(headers: &HeaderMap) -> AuthResult<Option<String>> {
    if !headers.contains_key(header::AUTHORIZATION) {
        return Ok(None);
    }
    match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(auth)) => Ok(Some(auth.token().to_string())),
        _ => Err(AuthError::InvalidAuthToken),
    }
}

fn vary_on_authorization(mut response: Response) -> Response {
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

// ============================================================================
// Gates
// ============================================================================

/// State for [`gate`]
pub struct GateState<R> {
    pub repo: Arc<R>,
    pub requirement: Requirement,
}

impl<R> Clone for GateState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            requirement: self.requirement,
        }
    }
}

impl<R> GateState<R> {
    pub fn new(repo: Arc<R>, requirement: Requirement) -> Self {
        Self { repo, requirement }
    }
}

/// Reject the request unless the caller meets `state.requirement`
///
/// Install with `route_layer(from_fn_with_state(GateState::new(..), gate::<R>))`.
pub async fn gate<R>(
    State(state): State<GateState<R>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: PermissionRepository + Send + Sync + 'static,
{
    let (parts, body) = req.into_parts();
    let context = AuthContext::from_parts(&parts);
    authorize(&*state.repo, &context, state.requirement).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Default-deny check of `context` against `requirement`
pub async fn authorize<R>(
    repo: &R,
    context: &AuthContext,
    requirement: Requirement,
) -> AuthResult<()>
where
    R: PermissionRepository + Sync,
{
    let Some(user) = context.user() else {
        return Err(AuthError::AuthenticationRequired);
    };
    if requirement == Requirement::Authenticated {
        return Ok(());
    }
    if !user.activated {
        return Err(AuthError::InactiveAccount);
    }

    match requirement {
        Requirement::Authenticated | Requirement::Activated => Ok(()),
        Requirement::Permission(code) => {
            let permissions = repo.get_all_for_user(user.id).await?;
            if permissions.includes(code) {
                Ok(())
            } else {
                tracing::debug!(user_id = %user.id, permission = code, "Permission denied");
                Err(AuthError::NotPermitted)
            }
        }
        Requirement::Role(role) => {
            if user.role.satisfies(role) {
                Ok(())
            } else {
                tracing::debug!(user_id = %user.id, required = %role, "Role denied");
                Err(AuthError::NotPermitted)
            }
        }
    }
}
