//! Update Record Use Case
//!
//! Read, patch, validate, then a version-gated write. Two clients that read
//! the same version race on the write and exactly one of them wins.

use std::marker::PhantomData;
use std::sync::Arc;

use kernel::extract::ExpectedVersion;
use kernel::id::Id;
use kernel::validation::Validator;

use crate::domain::{EntityRepository, Resource};
use crate::error::{CatalogError, CatalogResult};

pub struct UpdateRecordUseCase<E, R> {
    repo: Arc<R>,
    _resource: PhantomData<fn() -> E>,
}

impl<E, R> UpdateRecordUseCase<E, R>
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

    pub async fn execute(
        &self,
        id: Id<E::Marker>,
        expected: ExpectedVersion,
        patch: E::Patch,
    ) -> CatalogResult<E> {
        let mut record = self.repo.get(id).await?;

        if !expected.matches(record.version()) {
            return Err(CatalogError::EditConflict);
        }

        record.apply(patch);

        let mut v = Validator::new();
        record.validate(&mut v);
        CatalogError::check(v)?;

        self.repo
            .update(&mut record)
            .await
            .map_err(CatalogError::from_store::<E>)?;

        tracing::info!(
            resource = E::SINGULAR,
            id = %record.id(),
            version = record.version(),
            "Record updated"
        );
        Ok(record)
    }
}
