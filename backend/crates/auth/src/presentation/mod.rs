//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod context;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use context::{ActivatedUser, AuthContext, CurrentUser, Requirement};
pub use handlers::AuthAppState;
pub use middleware::{AuthMiddlewareState, GateState, authenticate, authorize, gate};
pub use router::{auth_router, auth_router_generic};
