//! # FleetDB Config
//!
//! Layered configuration for FleetDB: TOML files, `.env`, and `FLEETDB_`
//! environment variables, validated before use and reloadable at runtime.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
