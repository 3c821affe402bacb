//! Intake Infrastructure Library
//!
//! Shared plumbing for the intake API:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization

pub mod middleware;
pub mod telemetry;

pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    RequestIdSpan, SecurityHeaders,
};
pub use telemetry::{init_telemetry, LogFormat};
