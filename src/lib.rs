pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod holdings;
pub mod market;
pub mod state;
pub mod system;
