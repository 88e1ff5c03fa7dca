//! Catalog Domain Layer

pub mod department;
pub mod movie;
pub mod module;
pub mod repository;
pub mod resource;
pub mod runtime;

pub use department::{Department, DepartmentFilter, DepartmentInput, DepartmentPatch};
pub use module::{Module, ModuleFilter, ModuleInput, ModulePatch};
pub use movie::{Movie, MovieFilter, MovieInput, MoviePatch};
pub use repository::{EntityRepository, LocalEntityRepository};
pub use resource::Resource;
pub use runtime::Runtime;
