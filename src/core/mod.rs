//! Core application functionality
//!
//! This module contains the application shell around the merge engine:
//! - Settings and CLI handling
//! - Error types
//! - Entry-point helpers and the runner

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::ConfigFile;
pub use runner::run_app;
