//! CLI module for flatdb
//!
//! Provides command-line interface for:
//! - init: Create a data file from a field layout
//! - inspect: Print schema, counts and metrics
//! - find / book / release: One-shot contractor commands
//! - serve: JSON-lines session over stdin/stdout

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{book, find, init, inspect, release, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
