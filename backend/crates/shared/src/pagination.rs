//! Pagination & Sorting
//!
//! クエリ文字列の `page` / `page_size` / `sort` を解釈し、一覧レスポンスの
//! `metadata` を計算します。ソート列は許可リスト経由でしか SQL に入りません。

use std::collections::HashMap;

use serde::Serialize;

use crate::validation::Validator;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 10_000_000;

/// 公開名（クエリ文字列上の名前）と SQL 列名の組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 検証済みのソート指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    /// 既定のソート（`id ASC`）
    pub const fn by_id() -> Self {
        Self {
            column: "id",
            direction: SortDirection::Asc,
        }
    }

    /// `title` / `-year` の形式を許可リストと照合
    ///
    /// ```
    /// use kernel::pagination::{Sort, SortDirection, SortField};
    ///
    /// const SAFELIST: &[SortField] = &[SortField::new("moduleName", "module_name")];
    /// let sort = Sort::parse("-moduleName", SAFELIST).unwrap();
    /// assert_eq!(sort.column, "module_name");
    /// assert_eq!(sort.direction, SortDirection::Desc);
    /// assert!(Sort::parse("module_name; drop table", SAFELIST).is_none());
    /// ```
    pub fn parse(raw: &str, safelist: &[SortField]) -> Option<Self> {
        let (name, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (raw, SortDirection::Asc),
        };
        safelist
            .iter()
            .find(|f| f.name == name)
            .map(|f| Self {
                column: f.column,
                direction,
            })
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::by_id()
    }
}

/// 一覧取得の共通パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: Sort,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::by_id(),
        }
    }
}

impl Filters {
    /// クエリ文字列から読み取り、問題は `v` に記録する
    ///
    /// 検証に失敗したフィールドは既定値のまま返るので、呼び出し側は
    /// `v.finish()` を先に確認すること。
    pub fn from_query(
        query: &HashMap<String, String>,
        safelist: &[SortField],
        v: &mut Validator,
    ) -> Self {
        let page = read_int(query, "page", 1, v);
        let page_size = read_int(query, "page_size", DEFAULT_PAGE_SIZE, v);

        v.check(page > 0, "page", "must be greater than zero");
        v.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(page_size > 0, "page_size", "must be greater than zero");
        v.check(page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");

        let sort = match query.get("sort").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            None => Sort::by_id(),
            Some(raw) => Sort::parse(raw, safelist).unwrap_or_else(|| {
                v.add_error("sort", "invalid sort value");
                Sort::by_id()
            }),
        };

        Self {
            page,
            page_size,
            sort,
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

// ============================================================================
// Query string helpers
// ============================================================================

/// 空文字列は未指定として扱う
pub fn read_string(query: &HashMap<String, String>, key: &str) -> Option<String> {
    query
        .get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

pub fn read_int(query: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    match read_string(query, key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

/// `a,b,,c` → `["a", "b", "c"]`
pub fn read_csv(query: &HashMap<String, String>, key: &str) -> Vec<String> {
    read_string(query, key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Metadata
// ============================================================================

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// 一覧レスポンスの `metadata`
///
/// 該当 0 件のときは全フィールドが 0 になり、JSON では `{}` になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records <= 0 || page_size <= 0 {
            return Self::default();
        }
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}
