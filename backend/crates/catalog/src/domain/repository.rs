//! Repository Trait

use kernel::id::Id;
use kernel::pagination::{Filters, Metadata};
use platform::store::StoreError;

use crate::domain::resource::Resource;

/// Versioned CRUD over one resource table
#[trait_variant::make(EntityRepository: Send)]
pub trait LocalEntityRepository<E: Resource> {
    /// Writes the generated id, `created_at` and version 1 back into `record`
    async fn insert(&self, record: &mut E) -> Result<(), StoreError>;

    async fn get(&self, id: Id<E::Marker>) -> Result<E, StoreError>;

    /// Succeeds only while `record.version()` is current; bumps it by one
    async fn update(&self, record: &mut E) -> Result<(), StoreError>;

    async fn delete(&self, id: Id<E::Marker>) -> Result<(), StoreError>;

    async fn get_all(
        &self,
        filter: &E::Filter,
        page: &Filters,
    ) -> Result<(Vec<E>, Metadata), StoreError>;
}
