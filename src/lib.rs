//! Operator catalog search API library

pub mod cache;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod search;
pub mod security;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
