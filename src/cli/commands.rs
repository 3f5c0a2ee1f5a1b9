//! CLI command implementations
//!
//! One-shot commands open the store, answer with one JSON line on stdout and
//! exit. `serve` keeps the store open and answers one JSON line per request
//! until stdin closes.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::booking::{BookingRequest, ContractorCommands, CustomerId};
use crate::observability::{Event, Logger};
use crate::schema::{FieldDescriptor, SchemaCatalog};
use crate::storage::{RecordNumber, RecordStore};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};

/// One request of a serve session
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum SessionRequest {
    Find {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        location: Option<String>,
    },
    Book {
        record_number: RecordNumber,
        customer_id: u64,
    },
    Release {
        record_number: RecordNumber,
    },
    Inspect,
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, fields } => init(&config, &fields),
        Command::Inspect { config } => inspect(&config),
        Command::Find {
            config,
            name,
            location,
        } => find(&config, name.as_deref(), location.as_deref()),
        Command::Book {
            config,
            record,
            customer,
        } => book(&config, record, customer),
        Command::Release { config, record } => release(&config, record),
        Command::Serve { config } => serve(&config),
    }
}

/// Create a header-only data file with the given field layout
pub fn init(config_path: &Path, fields: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_path = config.data_path();

    if data_path.exists() {
        return Err(CliError::already_initialized(&data_path.display().to_string()));
    }

    let catalog = SchemaCatalog::new(parse_fields(fields)?);
    let store = RecordStore::initialize(data_path, &catalog, config.store_options())?;

    write_response(json!({
        "data_file": data_path.display().to_string(),
        "schema": store.catalog(),
    }))
}

/// Print schema, counts and metrics
pub fn inspect(config_path: &Path) -> CliResult<()> {
    let (config, store) = open_store(config_path)?;
    write_response(describe(&config, &store))
}

/// One-shot contractor search
pub fn find(config_path: &Path, name: Option<&str>, location: Option<&str>) -> CliResult<()> {
    let (_, store) = open_store(config_path)?;
    let commands = ContractorCommands::new(Arc::new(store))?;

    write_response(serde_json::to_value(commands.find(name, location))?)
}

/// One-shot booking
pub fn book(config_path: &Path, record_number: RecordNumber, customer: u64) -> CliResult<()> {
    let (_, store) = open_store(config_path)?;
    let commands = ContractorCommands::new(Arc::new(store))?;

    write_response(book_with(&commands, record_number, customer)?)
}

/// One-shot booking release
pub fn release(config_path: &Path, record_number: RecordNumber) -> CliResult<()> {
    let (_, store) = open_store(config_path)?;
    let commands = ContractorCommands::new(Arc::new(store))?;

    commands.booking().release(record_number)?;
    write_response(json!({ "record_number": record_number }))
}

/// Answer JSON requests from stdin until EOF
///
/// Request errors are answered and the session continues; a failure to read
/// stdin ends it.
pub fn serve(config_path: &Path) -> CliResult<()> {
    let (config, store) = open_store(config_path)?;
    let commands = ContractorCommands::new(Arc::new(store))?;
    let session = Uuid::new_v4().to_string();

    if config.log_events {
        Logger::event(
            Event::SessionBegin,
            &[("data_file", &config.data_path().display().to_string()), ("session", &session)],
        );
    }

    let mut handled: u64 = 0;
    for request in read_requests() {
        let outcome = request.and_then(|value| {
            handled += 1;
            handle_request(&config, &commands, value)
        });

        match outcome {
            Ok(data) => write_response(data)?,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                if e.ends_session() {
                    break;
                }
            }
        }
    }

    if config.log_events {
        Logger::event(
            Event::SessionEnd,
            &[("requests", &handled.to_string()), ("session", &session)],
        );
    }

    Ok(())
}

fn handle_request(config: &Config, commands: &ContractorCommands, value: Value) -> CliResult<Value> {
    let request: SessionRequest = serde_json::from_value(value)?;

    match request {
        SessionRequest::Find { name, location } => {
            let found = commands.find(name.as_deref(), location.as_deref());
            Ok(serde_json::to_value(found)?)
        }
        SessionRequest::Book {
            record_number,
            customer_id,
        } => book_with(commands, record_number, customer_id),
        SessionRequest::Release { record_number } => {
            commands.booking().release(record_number)?;
            Ok(json!({ "record_number": record_number }))
        }
        SessionRequest::Inspect => Ok(describe(config, commands.booking().store())),
    }
}

fn book_with(commands: &ContractorCommands, record_number: RecordNumber, customer: u64) -> CliResult<Value> {
    let request = BookingRequest {
        record_number,
        customer_id: CustomerId::new(customer)?,
    };
    commands.book(&request)?;

    Ok(serde_json::to_value(request)?)
}

fn describe(config: &Config, store: &RecordStore) -> Value {
    json!({
        "data_file": config.data_path().display().to_string(),
        "schema": store.catalog(),
        "records": store.len(),
        "live_records": store.live_count(),
        "metrics": store.metrics().snapshot(),
    })
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    if config.log_events {
        Logger::event(
            Event::ConfigLoaded,
            &[
                ("config", &config_path.display().to_string()),
                ("data_file", &config.data_path().display().to_string()),
            ],
        );
    }
    Ok(config)
}

fn open_store(config_path: &Path) -> CliResult<(Config, RecordStore)> {
    let config = load_config(config_path)?;
    let data_path = config.data_path();

    if !data_path.exists() {
        return Err(CliError::not_initialized(&data_path.display().to_string()));
    }

    let store = RecordStore::open_with_options(data_path, config.store_options())?;
    Ok((config, store))
}

/// Parse a `name:width,name:width` field layout
fn parse_fields(layout: &str) -> CliResult<Vec<FieldDescriptor>> {
    let fields = layout
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, width) = part
                .rsplit_once(':')
                .ok_or_else(|| CliError::invalid_request(format!("field '{}' is not name:width", part)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::invalid_request(format!("field '{}' has no name", part)));
            }
            let width: u16 = width
                .trim()
                .parse()
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| CliError::invalid_request(format!("field '{}' needs a width of 1 to 65535", part)))?;
            Ok(FieldDescriptor::new(name, width))
        })
        .collect::<CliResult<Vec<_>>>()?;

    if fields.is_empty() {
        return Err(CliError::invalid_request("at least one field is required"));
    }
    Ok(fields)
}
