//! Billing and reservation document services.
//!
//! Both services share one request-execution harness and one process
//! lifecycle (health monitoring plus coordinated, exactly-once shutdown).

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod services;
pub mod store;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::ShutdownCoordinator;
pub use services::ServiceKind;
