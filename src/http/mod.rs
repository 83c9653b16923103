//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → harness.rs (correlation, handler call, outcome mapping, request log)
//!     → services::* business handler
//!     → outcome.rs (Outcome → status + body)
//!     → Send to client
//! ```

pub mod correlation;
pub mod harness;
pub mod outcome;
pub mod server;

pub use correlation::{CorrelationContext, CorrelationRequirement, RequestId, REQUEST_ID_HEADER};
pub use harness::{ApiHandler, ApiRequest, FatalHook, Harness};
pub use outcome::{Outcome, ServiceError};
pub use server::HttpServer;
