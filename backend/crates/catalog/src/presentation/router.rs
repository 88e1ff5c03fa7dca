//! Catalog Router

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, patch, post};
use platform::store::PgStore;
use sqlx::PgPool;

use crate::domain::{EntityRepository, Resource};
use crate::presentation::handlers::{self, CatalogAppState};

/// Read and write routes of one resource, kept apart so the caller can put
/// a different gate on each before merging
pub struct ResourceRoutes {
    pub read: Router,
    pub write: Router,
}

impl ResourceRoutes {
    /// Both halves without any gate
    pub fn into_router(self) -> Router {
        self.read.merge(self.write)
    }
}

/// Routes for `E` over any repository implementation
///
/// Paths are relative (`/movies`, `/movies/{id}`); the caller nests them
/// under `/v1`.
pub fn resource_routes<E, R>(repo: Arc<R>) -> ResourceRoutes
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let state = CatalogAppState::<E, R>::new(repo);
    let item = format!("{}/{{id}}", E::PATH);

    let read = Router::new()
        .route(E::PATH, get(handlers::list::<E, R>))
        .route(&item, get(handlers::show::<E, R>))
        .with_state(state.clone());

    let write = Router::new()
        .route(E::PATH, post(handlers::create::<E, R>))
        .route(
            &item,
            patch(handlers::update::<E, R>).delete(handlers::delete::<E, R>),
        )
        .with_state(state);

    ResourceRoutes { read, write }
}

/// Routes for `E` backed by its PostgreSQL table
pub fn pg_routes<E: Resource>(pool: PgPool, query_timeout: Duration) -> ResourceRoutes {
    resource_routes::<E, PgStore<E>>(Arc::new(PgStore::new(pool, query_timeout)))
}
