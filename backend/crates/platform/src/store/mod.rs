//! Versioned Entity Store
//!
//! 1 つの `PgStore<E>` が各テーブルの CRUD を担当します。
//!
//! - Insert: `version = 1` で作成し、採番された id を書き戻す
//! - Update: `WHERE id = $a AND version = $b` の条件付き更新（0 行なら編集競合）
//! - Delete: バージョンは見ない
//! - GetAll: `count(*) OVER()` で総件数も同時に取得

mod error;
mod pg;
mod record;

pub use error::StoreError;
pub use pg::{PgStore, count_query, delete_query, insert_query, list_query, select_query, update_query};
pub use record::Versioned;
