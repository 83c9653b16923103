//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (STORE_CONNECTION_STRING, STORE_DATABASE, LISTEN_ADDRESS)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults so a service runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::HealthCheckConfig;
pub use schema::ListenerConfig;
pub use schema::ServiceConfig;
pub use schema::StoreBackend;
pub use schema::StoreConfig;
