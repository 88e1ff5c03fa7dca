//! Catalog Application Layer
//!
//! One use case per operation, generic over the resource so movies, modules
//! and departments share the same flow.

pub mod create_record;
pub mod delete_record;
pub mod get_record;
pub mod list_records;
pub mod update_record;

pub use create_record::CreateRecordUseCase;
pub use delete_record::DeleteRecordUseCase;
pub use get_record::GetRecordUseCase;
pub use list_records::{ListRecordsUseCase, Page};
pub use update_record::UpdateRecordUseCase;
