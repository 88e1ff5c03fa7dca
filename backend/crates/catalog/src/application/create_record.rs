//! Create Record Use Case

use std::marker::PhantomData;
use std::sync::Arc;

use kernel::validation::Validator;

use crate::domain::{EntityRepository, Resource};
use crate::error::{CatalogError, CatalogResult};

pub struct CreateRecordUseCase<E, R> {
    repo: Arc<R>,
    _resource: PhantomData<fn() -> E>,
}

impl<E, R> CreateRecordUseCase<E, R>
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

    pub async fn execute(&self, input: E::Input) -> CatalogResult<E> {
        let mut record = E::create(input);

        let mut v = Validator::new();
        record.validate(&mut v);
        CatalogError::check(v)?;

        self.repo
            .insert(&mut record)
            .await
            .map_err(CatalogError::from_store::<E>)?;

        tracing::info!(resource = E::SINGULAR, id = %record.id(), "Record created");
        Ok(record)
    }
}
