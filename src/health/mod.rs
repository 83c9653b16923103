//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer
//!     → probe the document store
//!     → ok: sleep until the next tick
//!     → failure or panic: one ShutdownTrigger::HealthMonitor, loop exits
//! ```
//!
//! # Design Decisions
//! - Not request-driven: catches silent store loss the request path never sees
//! - Probe failures and recovered panics share one code path to the coordinator
//! - The monitor holds a drain slot so the process never exits mid-probe

pub mod monitor;

pub use monitor::{HealthMonitor, MonitorFailure, Probe};
