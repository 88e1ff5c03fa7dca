//! Generic PostgreSQL store with optimistic concurrency

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use kernel::id::{Id, MIN_ID};
use kernel::pagination::{Filters, Metadata};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::error::StoreError;
use super::record::{Counted, Stamp, Versioned};
use crate::db;

// ============================================================================
// Query builders
// ============================================================================

/// `INSERT ... RETURNING id, created_at, version`
pub fn insert_query<E: Versioned>(record: &E) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(E::TABLE)
        .push(" (")
        .push(E::COLUMNS.join(", "))
        .push(") VALUES (");
    {
        let mut values = qb.separated(", ");
        record.push_values(&mut values);
    }
    qb.push(") RETURNING id, created_at, version");
    qb
}

pub fn select_query<E: Versioned>(id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(E::SELECT)
        .push(" FROM ")
        .push(E::TABLE)
        .push(" WHERE id = ")
        .push_bind(id);
    qb
}

/// Conditional update: matches only while `version` is still current
pub fn update_query<E: Versioned>(record: &E) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(E::TABLE)
        .push(" SET (")
        .push(E::COLUMNS.join(", "))
        .push(") = ROW(");
    {
        let mut values = qb.separated(", ");
        record.push_values(&mut values);
    }
    qb.push("), version = version + 1 WHERE id = ")
        .push_bind(record.id().get())
        .push(" AND version = ")
        .push_bind(record.version())
        .push(" RETURNING version");
    qb
}

pub fn delete_query<E: Versioned>(id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM ");
    qb.push(E::TABLE).push(" WHERE id = ").push_bind(id);
    qb
}

/// Page query with the window count; `id` breaks ties so paging is stable
pub fn list_query<E: Versioned>(filter: &E::Filter, page: &Filters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT count(*) OVER() AS total_records, ");
    qb.push(E::SELECT)
        .push(" FROM ")
        .push(E::TABLE)
        .push(" WHERE TRUE");
    E::push_filters(filter, &mut qb);
    qb.push(" ORDER BY ")
        .push(page.sort.column)
        .push(" ")
        .push(page.sort.direction.as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

pub fn count_query<E: Versioned>(filter: &E::Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM ");
    qb.push(E::TABLE).push(" WHERE TRUE");
    E::push_filters(filter, &mut qb);
    qb
}

// ============================================================================
// PgStore
// ============================================================================

/// CRUD over one [`Versioned`] table, every call bounded by `timeout`
pub struct PgStore<E> {
    pool: PgPool,
    timeout: Duration,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for PgStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

impl<E: Versioned> PgStore<E> {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a custom query under this store's deadline
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        db::within(self.timeout, fut).await
    }

    /// Insert `record`, writing the generated id, `created_at` and version back
    pub async fn insert(&self, record: &mut E) -> Result<(), StoreError> {
        let stamp = self
            .bounded(async {
                let mut qb = insert_query(record);
                Ok(qb.build_query_as::<Stamp>().fetch_one(&self.pool).await?)
            })
            .await?;

        record.stamp(Id::from_db(stamp.id), stamp.created_at, stamp.version);
        tracing::debug!(table = E::TABLE, id = stamp.id, "Record inserted");
        Ok(())
    }

    /// [`PgStore::insert`] on a caller-owned connection or transaction
    ///
    /// The caller is responsible for the deadline (see [`PgStore::bounded`]).
    pub async fn insert_in(&self, conn: &mut PgConnection, record: &mut E) -> Result<(), StoreError> {
        let mut qb = insert_query(record);
        let stamp = qb.build_query_as::<Stamp>().fetch_one(&mut *conn).await?;

        record.stamp(Id::from_db(stamp.id), stamp.created_at, stamp.version);
        tracing::debug!(table = E::TABLE, id = stamp.id, "Record inserted");
        Ok(())
    }

    pub async fn get(&self, id: Id<E::Marker>) -> Result<E, StoreError> {
        if id.get() < MIN_ID {
            return Err(StoreError::NotFound);
        }
        self.bounded(async {
            let mut qb = select_query::<E>(id.get());
            qb.build_query_as::<E>()
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    /// Version-gated update; zero matched rows is an [`StoreError::EditConflict`]
    pub async fn update(&self, record: &mut E) -> Result<(), StoreError> {
        record.touch();
        let version = self
            .bounded(async {
                let mut qb = update_query(record);
                let version = qb
                    .build_query_scalar::<i32>()
                    .fetch_optional(&self.pool)
                    .await?;
                version.ok_or(StoreError::EditConflict)
            })
            .await?;

        record.set_version(version);
        tracing::debug!(table = E::TABLE, id = %record.id(), version, "Record updated");
        Ok(())
    }

    pub async fn delete(&self, id: Id<E::Marker>) -> Result<(), StoreError> {
        if id.get() < MIN_ID {
            return Err(StoreError::NotFound);
        }
        let affected = self
            .bounded(async {
                let mut qb = delete_query::<E>(id.get());
                Ok(qb.build().execute(&self.pool).await?.rows_affected())
            })
            .await?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(table = E::TABLE, id = %id, "Record deleted");
        Ok(())
    }

    /// One page of records plus metadata
    pub async fn get_all(
        &self,
        filter: &E::Filter,
        page: &Filters,
    ) -> Result<(Vec<E>, Metadata), StoreError> {
        self.bounded(async {
            let mut qb = list_query::<E>(filter, page);
            let rows = qb
                .build_query_as::<Counted<E>>()
                .fetch_all(&self.pool)
                .await?;

            let total = match rows.first() {
                Some(row) => row.total_records,
                // past the last page the window count is unavailable
                None if page.page > 1 => {
                    let mut qb = count_query::<E>(filter);
                    qb.build_query_scalar::<i64>()
                        .fetch_one(&self.pool)
                        .await?
                }
                None => 0,
            };

            let records = rows.into_iter().map(|row| row.record).collect();
            Ok((records, Metadata::calculate(total, page.page, page.page_size)))
        })
        .await
    }
}
