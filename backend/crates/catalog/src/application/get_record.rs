//! Get Record Use Case

use std::marker::PhantomData;
use std::sync::Arc;

use kernel::id::Id;

use crate::domain::{EntityRepository, Resource};
use crate::error::CatalogResult;

pub struct GetRecordUseCase<E, R> {
    repo: Arc<R>,
    _resource: PhantomData<fn() -> E>,
}

impl<E, R> GetRecordUseCase<E, R>
where
    E: Resource,
    R: EntityRepository<E> + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            _resource: PhantomData,
        }
    }

    pub async fn execute(&self, id: Id<E::Marker>) -> CatalogResult<E> {
        Ok(self.repo.get(id).await?)
    }
}
