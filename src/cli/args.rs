//! CLI argument definitions using clap
//!
//! Commands:
//! - flatdb init --config <path> --fields name:width,...
//! - flatdb inspect --config <path>
//! - flatdb find --config <path> [--name <prefix>] [--location <prefix>]
//! - flatdb book --config <path> --record <n> --customer <id>
//! - flatdb release --config <path> --record <n>
//! - flatdb serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flatdb - a fixed-schema flat-file record store with record booking
#[derive(Parser, Debug)]
#[command(name = "flatdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new, empty data file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,

        /// Field layout, e.g. "name:32,location:64,owner:8"
        #[arg(long)]
        fields: String,
    },

    /// Print the schema, record counts and metrics
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,
    },

    /// Search contractors by name and location prefix
    Find {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,

        /// Name prefix, case-insensitive
        #[arg(long)]
        name: Option<String>,

        /// Location prefix, case-insensitive
        #[arg(long)]
        location: Option<String>,
    },

    /// Book a contractor for a customer
    Book {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,

        /// Record number of the contractor
        #[arg(long)]
        record: usize,

        /// Customer id, 1 to 99999999
        #[arg(long)]
        customer: u64,
    },

    /// Clear the booking of a contractor
    Release {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,

        /// Record number of the contractor
        #[arg(long)]
        record: usize,
    },

    /// Answer JSON requests from stdin, one per line
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./flatdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_arguments() {
        let cli = Cli::try_parse_from(["flatdb", "book", "--record", "3", "--customer", "42"]).unwrap();
        match cli.command {
            Command::Book {
                config,
                record,
                customer,
            } => {
                assert_eq!(config, PathBuf::from("./flatdb.json"));
                assert_eq!(record, 3);
                assert_eq!(customer, 42);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_find_filters_are_optional() {
        let cli = Cli::try_parse_from(["flatdb", "find", "--config", "db.json", "--name", "Dogs"]).unwrap();
        match cli.command {
            Command::Find { name, location, .. } => {
                assert_eq!(name.as_deref(), Some("Dogs"));
                assert_eq!(location, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_requires_fields() {
        assert!(Cli::try_parse_from(["flatdb", "init"]).is_err());
    }
}
