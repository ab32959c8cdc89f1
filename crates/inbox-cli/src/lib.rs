//! Inbox Agent CLI library.
//!
//! This library provides the core functionality for the `inbox` command-line
//! interface: configuration management, adapter construction, note input
//! parsing, command execution and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod providers;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Formatter;
