//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open store → Coordinator → Signal task → Health monitor → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     First trigger → Broadcast → Close store → Drain barrier → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGQUIT → ShutdownTrigger::Signal
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store first, listener last (traffic only when ready)
//! - Any number of triggers, exactly one shutdown
//! - In-flight requests get a bounded grace period after the drain barrier

pub mod drain;
pub mod inflight;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use drain::{DrainBarrier, DrainSlot};
pub use inflight::{InFlightGuard, InFlightTracker};
pub use shutdown::{CriticalResource, ShutdownCoordinator, ShutdownListener, ShutdownTrigger};
pub use startup::{run, start, start_with_store, RunningService, StartupError};
