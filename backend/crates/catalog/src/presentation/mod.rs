//! Catalog Presentation Layer

pub mod dto;
pub mod handlers;
pub mod router;

pub use router::{ResourceRoutes, pg_routes, resource_routes};
