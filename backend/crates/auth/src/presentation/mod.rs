//! Presentation Layer
//!
//! HTTP surface: DTOs, handlers, router, and the bearer-token guard.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{AuthMiddlewareState, BearerToken, require_access_token};
pub use router::{auth_router, auth_router_generic};
