//! Command-line interface: thresholds, output selection, and sink
//! construction.
//!
//! Outputs are repeatable. `-` selects JSON on stdout (and disables
//! logging so log lines never interleave with the documents); paths with
//! an SQLite extension select the database sink; anything else is a JSON
//! file opened in append mode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use crate::database::SqliteConnection;
use crate::storage::{DatabaseStorage, JsonStorage, Store};

const DEFAULT_N_EVENTS: usize = 100;
const DEFAULT_STORE_AFTER: u64 = 60;

const LICENSE: &str = "MIT License";
const COPYRIGHT: &str = "Copyright (c) 2026 the evcap authors";

const SQLITE_EXTENSIONS: [&str; 6] = [".sqlite", ".sqlite3", ".db", ".db3", ".s3db", ".sl3"];

/// Show and store events from input devices.
#[derive(Parser, Debug)]
#[command(name = "evcap", disable_version_flag = true)]
pub struct Cli {
    /// Controls how many events to receive before outputting them to the
    /// store.
    #[arg(short = 'n', long, default_value_t = DEFAULT_N_EVENTS)]
    pub store_n_events: usize,

    /// Store events at least every interval specified with this option,
    /// even if fewer events than `--store-n-events` have been received.
    #[arg(short = 's', long, default_value_t = DEFAULT_STORE_AFTER)]
    pub store_after_seconds: u64,

    /// The output location of the storage. '-' is supported to output to
    /// stdout when using json storage and this disables any logging.
    #[arg(short = 'o', long = "output")]
    pub output: Vec<String>,

    /// Print version
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Drive the pipeline with a simulated input backend for this many
    /// events, then exit.
    #[arg(long, value_name = "EVENTS")]
    pub simulate: Option<usize>,
}

/// The type of storage an output location selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Sqlite,
    Json,
}

impl Cli {
    /// Parse the command line, normalising output locations to lowercase
    /// and defaulting to stdout when none are given.
    pub fn parse_args() -> Self {
        Self::normalise(Self::parse())
    }

    fn normalise(mut cli: Self) -> Self {
        for output in &mut cli.output {
            *output = output.to_lowercase();
        }
        if cli.output.is_empty() {
            cli.output.push("-".to_owned());
        }
        cli
    }

    /// Whether logging should be disabled because a sink writes to stdout.
    pub fn logging_disabled(&self) -> bool {
        self.output.iter().any(|output| output == "-")
    }

    pub fn store_after(&self) -> Duration {
        Duration::from_secs(self.store_after_seconds)
    }
}

/// Determine the storage type from an output location.
pub fn storage_type(output: &str) -> StorageType {
    if SQLITE_EXTENSIONS
        .iter()
        .any(|extension| output.ends_with(extension))
    {
        StorageType::Sqlite
    } else {
        StorageType::Json
    }
}

/// Build a sink for each output location, initialising database schemas.
pub fn build_stores(outputs: &[String]) -> anyhow::Result<Vec<Arc<dyn Store>>> {
    let mut stores: Vec<Arc<dyn Store>> = Vec::with_capacity(outputs.len());

    for output in outputs {
        match storage_type(output) {
            StorageType::Sqlite => {
                let storage = DatabaseStorage::new(SqliteConnection::new(), output.clone());
                storage
                    .init()
                    .with_context(|| format!("initialising database at {output}"))?;
                stores.push(Arc::new(storage));
            }
            StorageType::Json if output == "-" => {
                stores.push(Arc::new(JsonStorage::stdout()));
            }
            StorageType::Json => {
                let storage = JsonStorage::append_to_file(output)
                    .with_context(|| format!("opening json output {output}"))?;
                stores.push(Arc::new(storage));
            }
        }
    }

    Ok(stores)
}

/// Print the version, license, and copyright lines.
pub fn print_version() {
    println!(
        "evcap {}\n\n{LICENSE}\n{COPYRIGHT}",
        env!("CARGO_PKG_VERSION")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::normalise(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn defaults_match_the_documented_thresholds() {
        let cli = parse(&["evcap"]);

        assert_eq!(cli.store_n_events, 100);
        assert_eq!(cli.store_after(), Duration::from_secs(60));
        assert_eq!(cli.output, ["-"]);
        assert!(cli.logging_disabled());
    }

    #[test]
    fn thresholds_and_outputs_are_parsed() {
        let cli = parse(&[
            "evcap", "-n", "5", "-s", "2", "-o", "events.SQLITE", "-o", "log.json",
        ]);

        assert_eq!(cli.store_n_events, 5);
        assert_eq!(cli.store_after(), Duration::from_secs(2));
        assert_eq!(cli.output, ["events.sqlite", "log.json"]);
        assert!(!cli.logging_disabled());
    }

    #[test]
    fn sqlite_extensions_select_the_database_sink() {
        for output in [
            "events.sqlite",
            "events.sqlite3",
            "events.db",
            "events.db3",
            "events.s3db",
            "events.sl3",
        ] {
            assert_eq!(storage_type(output), StorageType::Sqlite);
        }

        assert_eq!(storage_type("-"), StorageType::Json);
        assert_eq!(storage_type("events.json"), StorageType::Json);
        assert_eq!(storage_type("events"), StorageType::Json);
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        assert!(Cli::try_parse_from(["evcap", "--frobnicate"]).is_err());
    }

    #[test]
    fn build_stores_creates_a_database_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.sqlite");
        let outputs = vec![path.to_str().unwrap().to_owned()];

        let stores = build_stores(&outputs).unwrap();
        assert_eq!(stores.len(), 1);
        assert!(path.exists());
    }

    #[test]
    fn build_stores_opens_json_files_in_append_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, "existing\n").unwrap();
        let outputs = vec![path.to_str().unwrap().to_owned()];

        let stores = build_stores(&outputs).unwrap();
        assert_eq!(stores.len(), 1);

        // The existing contents were not truncated.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\n");
    }
}
