//! Versioned record contract
//!
//! テーブルごとの差分（列、ソート許可リスト、フィルタ）だけをここで記述し、
//! CRUD と楽観的ロックは [`super::PgStore`] が共通で扱います。

use chrono::{DateTime, Utc};
use kernel::id::Id;
use kernel::pagination::SortField;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};

/// A row with `id`, `created_at` and a `version` stamp
pub trait Versioned: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    /// Marker for this table's [`Id`]
    type Marker: Send + Sync + 'static;
    /// List filter (use `()` when the table has none)
    type Filter: Send + Sync;

    const TABLE: &'static str;
    /// Writable columns, in the order [`Versioned::push_values`] binds them
    const COLUMNS: &'static [&'static str];
    /// Select list, including `id`, `created_at` and `version`
    const SELECT: &'static str;
    const SORT_SAFELIST: &'static [SortField];

    fn id(&self) -> Id<Self::Marker>;
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);

    /// Written back after an insert
    fn stamp(&mut self, id: Id<Self::Marker>, created_at: DateTime<Utc>, version: i32);

    /// Refresh derived columns (e.g. `updated_at`) before an update
    fn touch(&mut self) {}

    /// Bind one value per entry of [`Versioned::COLUMNS`]
    fn push_values(&self, sep: &mut Separated<'_, '_, Postgres, &'static str>);

    /// Append ` AND ...` clauses for `filter`
    fn push_filters(_filter: &Self::Filter, _qb: &mut QueryBuilder<'_, Postgres>) {}
}

/// `RETURNING id, created_at, version`
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Stamp {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

/// A list row carrying the `count(*) OVER()` window total
pub(crate) struct Counted<E> {
    pub total_records: i64,
    pub record: E,
}

impl<'r, E: Versioned> FromRow<'r, PgRow> for Counted<E> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            total_records: row.try_get("total_records")?,
            record: E::from_row(row)?,
        })
    }
}
