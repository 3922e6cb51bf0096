//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Logging/metrics → Catalog → Stores → Router → Bind
//!
//! Background (sweeper.rs):
//!     Interval tick → purge expired cache entries / idle counters
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → sweepers stop, server drains
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, listeners last
//! - Fail fast: any startup error is fatal
//! - Background tasks subscribe to one broadcast shutdown channel

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod sweeper;

pub use shutdown::Shutdown;
