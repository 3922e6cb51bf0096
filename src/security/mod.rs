//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (exempt path? pass through untouched)
//!     → client_identity.rs (proxy headers → peer address → sentinel)
//!     → limiter.rs (atomic test-and-increment on "<namespace>:<client>")
//!         → memory store, or redis_counter.rs for shared state
//!     → handler, then X-RateLimit-* headers on the way out
//! ```
//!
//! # Design Decisions
//! - Limiting runs before cache and query work, so it bounds all work
//! - Sliding-log windows: no burst of 2x limit around window edges
//! - Fail open on counter store errors, never crash the request path

pub mod client_identity;
pub mod limiter;
pub mod rate_limit;
pub mod redis_counter;

pub use client_identity::{resolve_client_id, PeerAddr, UNKNOWN_CLIENT};
pub use limiter::{Acquire, CounterStore, LimiterError, MemoryCounterStore, MovingWindowLimiter};
pub use rate_limit::{rate_limit_middleware, RateLimitExceeded, RateLimitGate, RouteTemplate};
pub use redis_counter::RedisCounterStore;
