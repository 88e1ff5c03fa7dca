//! Catalog Backend Module
//!
//! Movies, course modules and departments behind one generic CRUD surface.
//!
//! Clean Architecture structure:
//! - `domain/` - Records, request bodies, list filters, repository trait
//! - `application/` - Create / get / update / delete / list use cases
//! - `infra/` - Row mapping onto the shared versioned store
//! - `presentation/` - Generic handlers, envelopes, router
//!
//! Every update is version-gated: a write based on a stale version fails
//! with 409 instead of overwriting.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use domain::{Department, Module, Movie, Resource};
pub use error::{CatalogError, CatalogResult};
pub use presentation::{ResourceRoutes, pg_routes, resource_routes};
