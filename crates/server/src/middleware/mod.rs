//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (single configured origin, if any)
//!
//! Authentication is per-route through the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireDonor, RequireServiceRole};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
