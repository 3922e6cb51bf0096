//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → security::rate_limit (gate, route layer)
//!     → handlers.rs (parse criteria, run cached search)
//!     → error.rs (uniform error bodies)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, AppError};
pub use handlers::X_CACHE;
pub use server::{build_router, AppState, HttpServer};
