//! REST API: router, role middleware, handlers and error mapping.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::build_router;
pub use types::{AppState, CurrentUser};
