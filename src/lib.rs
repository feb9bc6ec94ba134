pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod services;
pub mod types;

/// Stub collaborators for integration tests.
pub mod testing;

pub use app::{router, AppState};
