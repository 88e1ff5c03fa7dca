//! Auth Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use platform::background::BackgroundTasks;

use crate::application::config::AuthConfig;
use crate::application::mailer::Mailer;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::infra::{mailer::FileMailer, postgres::PgAuthRepository};
use crate::presentation::context::Requirement;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{GateState, gate};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(
    repo: Arc<PgAuthRepository>,
    mailer: Arc<FileMailer>,
    tasks: BackgroundTasks,
    config: AuthConfig,
) -> Router {
    auth_router_generic(repo, mailer, tasks, config)
}

/// Create a generic Auth router for any repository / mailer implementation
///
/// Routes are relative; the caller nests them under `/v1`. The
/// `authenticate` middleware must wrap the result.
pub fn auth_router_generic<R, M>(
    repo: Arc<R>,
    mailer: Arc<M>,
    tasks: BackgroundTasks,
    config: AuthConfig,
) -> Router
where
    R: AuthRepository,
    M: Mailer + Sync + 'static,
{
    let state = AuthAppState {
        repo: repo.clone(),
        mailer,
        tasks,
        config: Arc::new(config),
    };

    let admin = Router::new()
        .route("/users/{id}/role", put(handlers::set_role::<R, M>))
        .route(
            "/users/{id}/permissions",
            post(handlers::grant_permissions::<R, M>),
        )
        .route_layer(middleware::from_fn_with_state(
            GateState::new(repo, Requirement::Role(UserRole::Admin)),
            gate::<R>,
        ));

    Router::new()
        .route("/users", post(handlers::register::<R, M>))
        .route("/users/activated", put(handlers::activate::<R, M>))
        .route(
            "/users/me",
            get(handlers::show_me)
                .patch(handlers::update_me::<R, M>)
                .delete(handlers::delete_me::<R, M>),
        )
        .route(
            "/tokens/authentication",
            post(handlers::create_authentication_token::<R, M>)
                .delete(handlers::delete_authentication_tokens::<R, M>),
        )
        .route(
            "/tokens/activation",
            post(handlers::create_activation_token::<R, M>),
        )
        .merge(admin)
        .with_state(state)
}
