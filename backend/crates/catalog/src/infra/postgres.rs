//! PostgreSQL Row Mapping
//!
//! Table layout, sort safelists and list filters for the three catalog
//! tables. CRUD itself is the shared [`PgStore`].

use chrono::{DateTime, Utc};
use kernel::id::{Id, MovieId, ModuleId, DepartmentId, markers};
use kernel::pagination::{Filters, Metadata, SortField};
use platform::store::{PgStore, StoreError, Versioned};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};

use crate::domain::repository::EntityRepository;
use crate::domain::{
    Department, DepartmentFilter, Module, ModuleFilter, Movie, MovieFilter, Resource, Runtime,
};

/// `AND to_tsvector('simple', col) @@ plainto_tsquery('simple', $n)`
fn push_full_text(qb: &mut QueryBuilder<'_, Postgres>, column: &str, terms: &str) {
    qb.push(" AND to_tsvector('simple', ")
        .push(column)
        .push(") @@ plainto_tsquery('simple', ")
        .push_bind(terms.to_owned())
        .push(")");
}

// ============================================================================
// movies
// ============================================================================

impl Versioned for Movie {
    type Marker = markers::Movie;
    type Filter = MovieFilter;

    const TABLE: &'static str = "movies";
    const COLUMNS: &'static [&'static str] = &["title", "year", "runtime", "genres"];
    const SELECT: &'static str = "id, created_at, title, year, runtime, genres, version";
    const SORT_SAFELIST: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("title", "title"),
        SortField::new("year", "year"),
        SortField::new("runtime", "runtime"),
    ];

    fn id(&self) -> MovieId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn stamp(&mut self, id: MovieId, created_at: DateTime<Utc>, version: i32) {
        self.id = id;
        self.created_at = created_at;
        self.version = version;
    }

    fn push_values(&self, sep: &mut Separated<'_, '_, Postgres, &'static str>) {
        sep.push_bind(self.title.clone());
        sep.push_bind(self.year);
        sep.push_bind(self.runtime.minutes());
        sep.push_bind(self.genres.clone());
    }

    fn push_filters(filter: &MovieFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(title) = &filter.title {
            push_full_text(qb, "title", title);
        }
        if !filter.genres.is_empty() {
            qb.push(" AND genres @> ").push_bind(filter.genres.clone());
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Movie {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            runtime: Runtime(row.try_get("runtime")?),
            genres: row.try_get("genres")?,
            version: row.try_get("version")?,
        })
    }
}

// ============================================================================
// modules
// ============================================================================

impl Versioned for Module {
    type Marker = markers::Module;
    type Filter = ModuleFilter;

    const TABLE: &'static str = "modules";
    const COLUMNS: &'static [&'static str] =
        &["module_name", "module_duration", "exam_type", "updated_at"];
    const SELECT: &'static str =
        "id, created_at, updated_at, module_name, module_duration, exam_type, version";
    const SORT_SAFELIST: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("moduleName", "module_name"),
        SortField::new("moduleDuration", "module_duration"),
        SortField::new("examType", "exam_type"),
    ];

    fn id(&self) -> ModuleId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn stamp(&mut self, id: ModuleId, created_at: DateTime<Utc>, version: i32) {
        self.id = id;
        self.created_at = created_at;
        self.version = version;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn push_values(&self, sep: &mut Separated<'_, '_, Postgres, &'static str>) {
        sep.push_bind(self.module_name.clone());
        sep.push_bind(self.module_duration.minutes());
        sep.push_bind(self.exam_type.clone());
        sep.push_bind(self.updated_at);
    }

    fn push_filters(filter: &ModuleFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(module_name) = &filter.module_name {
            push_full_text(qb, "module_name", module_name);
        }
        if let Some(exam_type) = &filter.exam_type {
            qb.push(" AND exam_type = ").push_bind(exam_type.clone());
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Module {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            module_name: row.try_get("module_name")?,
            module_duration: Runtime(row.try_get("module_duration")?),
            exam_type: row.try_get("exam_type")?,
            version: row.try_get("version")?,
        })
    }
}

// ============================================================================
// departments
// ============================================================================

impl Versioned for Department {
    type Marker = markers::Department;
    type Filter = DepartmentFilter;

    const TABLE: &'static str = "departments";
    const COLUMNS: &'static [&'static str] = &[
        "department_name",
        "staff_quantity",
        "department_director",
        "module_id",
    ];
    const SELECT: &'static str = "id, created_at, department_name, staff_quantity, \
                                  department_director, module_id, version";
    const SORT_SAFELIST: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("departmentName", "department_name"),
        SortField::new("staffQuantity", "staff_quantity"),
    ];

    fn id(&self) -> DepartmentId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn stamp(&mut self, id: DepartmentId, created_at: DateTime<Utc>, version: i32) {
        self.id = id;
        self.created_at = created_at;
        self.version = version;
    }

    fn push_values(&self, sep: &mut Separated<'_, '_, Postgres, &'static str>) {
        sep.push_bind(self.department_name.clone());
        sep.push_bind(self.staff_quantity);
        sep.push_bind(self.department_director.clone());
        sep.push_bind(self.module_id);
    }

    fn push_filters(filter: &DepartmentFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(department_name) = &filter.department_name {
            push_full_text(qb, "department_name", department_name);
        }
        if let Some(module_id) = filter.module_id {
            qb.push(" AND module_id = ").push_bind(module_id);
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Department {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            department_name: row.try_get("department_name")?,
            staff_quantity: row.try_get("staff_quantity")?,
            department_director: row.try_get("department_director")?,
            module_id: row.try_get("module_id")?,
            version: row.try_get("version")?,
        })
    }
}

// ============================================================================
// Repository
// ============================================================================

impl<E: Resource> EntityRepository<E> for PgStore<E> {
    async fn insert(&self, record: &mut E) -> Result<(), StoreError> {
        PgStore::insert(self, record).await
    }

    async fn get(&self, id: Id<E::Marker>) -> Result<E, StoreError> {
        PgStore::get(self, id).await
    }

    async fn update(&self, record: &mut E) -> Result<(), StoreError> {
        PgStore::update(self, record).await
    }

    async fn delete(&self, id: Id<E::Marker>) -> Result<(), StoreError> {
        PgStore::delete(self, id).await
    }

    async fn get_all(
        &self,
        filter: &E::Filter,
        page: &Filters,
    ) -> Result<(Vec<E>, Metadata), StoreError> {
        PgStore::get_all(self, filter, page).await
    }
}
