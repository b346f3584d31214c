//! HTTP API for the intake application.
//!
//! Routes are nested under `/api/` and pass through CORS and the audit
//! logger. Handlers are thin: they decode the request, call a service and
//! map `CareError` to a status code.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
pub use types::ApiContext;
