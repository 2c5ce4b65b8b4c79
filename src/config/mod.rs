//! Configuration
//!
//! Layered loading of [`config::AppConfig`]: built-in defaults, a TOML file,
//! then environment variables.

pub mod config;
pub mod loader;
