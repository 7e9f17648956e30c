//! HTTP server for the stage promotion engine.
//!
//! Owns a single managed checkout and exposes fleet status, refresh and
//! push-promotion over a JSON API.

pub mod config;
pub mod error;
pub mod repo;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ServerConfig;
pub use repo::ManagedRepo;
pub use state::AppState;
