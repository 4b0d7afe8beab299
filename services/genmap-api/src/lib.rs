//! Genmap API Service Library
//!
//! HTTP server that renders typhoon position maps and publishes them
//! to S3-compatible object storage.

pub mod config;
pub mod handlers;
pub mod state;

pub use handlers::build_router;
