//! Campaign records backend service

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// HTTP routes
pub mod routes;

/// Server setup and startup
pub mod server;

/// Shared API types
pub mod types;
