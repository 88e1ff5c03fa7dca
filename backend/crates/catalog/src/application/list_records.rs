//! List Records Use Case

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use kernel::pagination::{Filters, Metadata};
use kernel::validation::Validator;

use crate::domain::{EntityRepository, Resource};
use crate::error::{CatalogError, CatalogResult};

/// One page of records
#[derive(Debug)]
pub struct Page<E> {
    pub records: Vec<E>,
    pub metadata: Metadata,
}

pub struct ListRecordsUseCase<E, R> {
    repo: Arc<R>,
    _resource: PhantomData<fn() -> E>,
}

impl<E, R> ListRecordsUseCase<E, R>
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

    /// `query` is the raw query string; filter and paging problems are
    /// reported together
    pub async fn execute(&self, query: &HashMap<String, String>) -> CatalogResult<Page<E>> {
        let mut v = Validator::new();
        let filter = E::parse_filter(query, &mut v);
        let page = Filters::from_query(query, E::SORT_SAFELIST, &mut v);
        CatalogError::check(v)?;

        let (records, metadata) = self.repo.get_all(&filter, &page).await?;
        Ok(Page { records, metadata })
    }
}
