pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod money;
pub mod month;
pub mod server;
pub mod services;
pub mod state;
pub mod xsrf;

/// Application version from Cargo.toml (single source of truth)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
