//! Layered configuration for the CLI: built-in defaults, then an optional
//! TOML file, then `-S key=value` settings, then command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
