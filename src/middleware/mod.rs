pub mod auth;
pub mod cors;
pub mod resource;

pub use auth::{require_admin, require_session};
pub use cors::cors_middleware;
pub use resource::{resolve_resource, Collection};
