// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface.
//!
//! Argument parsing, console logging macros and the `run` command.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros.
pub mod logging;

/// Monitoring loop.
pub mod run;
