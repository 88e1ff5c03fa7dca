//! Router assembly
//!
//! Everything lives under `/v1`. Catalog routes get their gates here; the
//! auth router gates its own admin routes.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use auth::middleware::{AuthMiddlewareState, GateState, Requirement, authenticate, gate};
use auth::models::{
    permission::{MOVIES_READ, MOVIES_WRITE},
    user_role::UserRole,
};
use auth::domain::repository::PermissionRepository;
use auth::{AuthConfig, FileMailer, PgAuthRepository, auth_router};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use catalog::{Department, Module, Movie, Resource, ResourceRoutes, pg_routes};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::extract::AppJson;
use platform::background::BackgroundTasks;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{RateLimitState, rate_limit};

/// What the router needs from startup
pub struct AppParts {
    pub pool: PgPool,
    pub query_timeout: Duration,
    pub auth_repo: Arc<PgAuthRepository>,
    pub mailer: Arc<FileMailer>,
    pub tasks: BackgroundTasks,
    pub auth_config: AuthConfig,
    pub rate_limit: RateLimitState,
    pub frontend_origins: Vec<String>,
    pub system_info: SystemInfo,
}

pub fn build_router(parts: AppParts) -> Router {
    let repo = parts.auth_repo;

    let v1 = Router::new()
        .route("/healthcheck", get(healthcheck).with_state(parts.system_info))
        .merge(gated_catalog(
            repo.clone(),
            pg_routes::<Movie>(parts.pool.clone(), parts.query_timeout),
            pg_routes::<Module>(parts.pool.clone(), parts.query_timeout),
            pg_routes::<Department>(parts.pool, parts.query_timeout),
        ))
        .merge(auth_router(
            repo.clone(),
            parts.mailer,
            parts.tasks,
            parts.auth_config,
        ));

    tracing::debug!(
        resources = ?[Movie::PATH, Module::PATH, Department::PATH],
        "Catalog routes mounted"
    );

    Router::new()
        .nest("/v1", v1)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(cors(&parts.frontend_origins))
                .layer(from_fn_with_state(parts.rate_limit, rate_limit))
                .layer(from_fn_with_state(
                    AuthMiddlewareState::new(repo),
                    authenticate::<PgAuthRepository>,
                )),
        )
}

/// Movies need the `movies:*` permissions; modules and departments are read
/// by any user and written by admins
pub fn gated_catalog<R>(
    repo: Arc<R>,
    movies: ResourceRoutes,
    modules: ResourceRoutes,
    departments: ResourceRoutes,
) -> Router
where
    R: PermissionRepository + Send + Sync + 'static,
{
    let guard = |routes: Router, requirement: Requirement| {
        routes.route_layer(from_fn_with_state(
            GateState::new(repo.clone(), requirement),
            gate::<R>,
        ))
    };
    let gated = |routes: ResourceRoutes, read: Requirement, write: Requirement| {
        guard(routes.read, read).merge(guard(routes.write, write))
    };

    gated(
        movies,
        Requirement::Permission(MOVIES_READ),
        Requirement::Permission(MOVIES_WRITE),
    )
    .merge(gated(
        modules,
        Requirement::Role(UserRole::User),
        Requirement::Role(UserRole::Admin),
    ))
    .merge(gated(
        departments,
        Requirement::Role(UserRole::User),
        Requirement::Role(UserRole::Admin),
    ))
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(kernel::extract::EXPECTED_VERSION_HEADER),
        ]))
}

// ============================================================================
// Healthcheck & fallbacks
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: &'static str,
}

impl SystemInfo {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    system_info: SystemInfo,
}

/// GET /v1/healthcheck
async fn healthcheck(State(system_info): State<SystemInfo>) -> AppJson<HealthResponse> {
    AppJson(HealthResponse {
        status: "available",
        system_info,
    })
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::new(
        ErrorKind::MethodNotAllowed,
        format!("the {method} method is not supported for this resource"),
    )
}

async fn not_found() -> AppError {
    AppError::from_kind(ErrorKind::NotFound)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    AppError::from_kind(ErrorKind::InternalServerError).into_response()
}
