//! HTTP Handlers
//!
//! One set of handlers serves every resource; `E` picks the table and the
//! envelope keys.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use kernel::extract::{AppJson, ExpectedVersion};
use kernel::id::Id;

use crate::application::{
    CreateRecordUseCase, DeleteRecordUseCase, GetRecordUseCase, ListRecordsUseCase,
    UpdateRecordUseCase,
};
use crate::domain::{EntityRepository, Resource};
use crate::error::{CatalogError, CatalogResult};
use crate::presentation::dto::{Envelope, MessageEnvelope};

/// Shared state for one resource's handlers
pub struct CatalogAppState<E, R> {
    pub repo: Arc<R>,
    _resource: PhantomData<fn() -> E>,
}

impl<E, R> CatalogAppState<E, R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            _resource: PhantomData,
        }
    }
}

impl<E, R> Clone for CatalogAppState<E, R> {
    fn clone(&self) -> Self {
        Self::new(self.repo.clone())
    }
}

/// Ids that can never exist are reported as missing records
fn parse_id<E: Resource>(raw: &str) -> CatalogResult<Id<E::Marker>> {
    raw.parse().map_err(|_| CatalogError::NotFound)
}

/// POST /v1/{resources}
pub async fn create<E, R>(
    State(state): State<CatalogAppState<E, R>>,
    AppJson(input): AppJson<E::Input>,
) -> CatalogResult<impl IntoResponse>
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let record = CreateRecordUseCase::<E, R>::new(state.repo).execute(input).await?;
    let location = format!("/v1{}/{}", E::PATH, record.id());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        AppJson(Envelope::new(E::SINGULAR, record)),
    ))
}

/// GET /v1/{resources}/{id}
pub async fn show<E, R>(
    State(state): State<CatalogAppState<E, R>>,
    Path(id): Path<String>,
) -> CatalogResult<AppJson<Envelope<E>>>
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let id = parse_id::<E>(&id)?;
    let record = GetRecordUseCase::<E, R>::new(state.repo).execute(id).await?;
    Ok(AppJson(Envelope::new(E::SINGULAR, record)))
}

/// GET /v1/{resources}
pub async fn list<E, R>(
    State(state): State<CatalogAppState<E, R>>,
    Query(query): Query<HashMap<String, String>>,
) -> CatalogResult<AppJson<Envelope<Vec<E>>>>
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let page = ListRecordsUseCase::<E, R>::new(state.repo).execute(&query).await?;
    Ok(AppJson(
        Envelope::new(E::PLURAL, page.records).with_metadata(page.metadata),
    ))
}

/// PATCH /v1/{resources}/{id}
pub async fn update<E, R>(
    State(state): State<CatalogAppState<E, R>>,
    Path(id): Path<String>,
    expected: ExpectedVersion,
    AppJson(patch): AppJson<E::Patch>,
) -> CatalogResult<AppJson<Envelope<E>>>
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let id = parse_id::<E>(&id)?;
    let record = UpdateRecordUseCase::<E, R>::new(state.repo)
        .execute(id, expected, patch)
        .await?;
    Ok(AppJson(Envelope::new(E::SINGULAR, record)))
}

/// DELETE /v1/{resources}/{id}
pub async fn delete<E, R>(
    State(state): State<CatalogAppState<E, R>>,
    Path(id): Path<String>,
) -> CatalogResult<AppJson<MessageEnvelope>>
where
    E: Resource,
    R: EntityRepository<E> + Sync + 'static,
{
    let id = parse_id::<E>(&id)?;
    DeleteRecordUseCase::<E, R>::new(state.repo).execute(id).await?;
    Ok(AppJson(MessageEnvelope {
        message: format!("{} successfully deleted", E::SINGULAR),
    }))
}
