//! Desktop CLI over the names store.
//!
//! # Responsibility
//! - Run one store operation per invocation against a database file.
//! - Exercise `namebook_core` outside the Flutter/FFI runtime.
//!
//! # Exit codes
//! - `0` success, `1` id not found, `2` storage or logging failure.

use clap::{Parser, Subcommand};
use log::error;
use namebook_core::{default_log_level, init_logging, RecordId, RecordStore, StoreResult};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "namebook", version, about = "Manage a local list of names")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "NAMEBOOK_DB_PATH", default_value = "namebook.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print all names ordered by id.
    List,
    /// Add a name and print its id.
    Add { text: String },
    /// Replace the text of an existing name.
    Update { id: RecordId, text: String },
    /// Delete a name by id.
    Delete { id: RecordId },
    /// Check core crate linkage.
    Ping,
}

enum Outcome {
    Done,
    NotFound(RecordId),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }

    match run(&cli) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NotFound(id)) => {
            eprintln!("not found: {id}");
            ExitCode::from(1)
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error error_code={}", err.code());
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> StoreResult<Outcome> {
    if let Command::Ping = cli.command {
        println!("namebook_core ping={}", namebook_core::ping());
        println!("namebook_core version={}", namebook_core::core_version());
        return Ok(Outcome::Done);
    }

    let mut store = RecordStore::open(&cli.db)?;
    store.initialize()?;

    let outcome = match &cli.command {
        Command::List => {
            for record in store.list_all()? {
                println!("{}\t{}", record.id, record.text);
            }
            Outcome::Done
        }
        Command::Add { text } => {
            let record = store.add(text.as_str())?;
            println!("{}", record.id);
            Outcome::Done
        }
        Command::Update { id, text } => found_or(store.update(*id, text.as_str())?, *id),
        Command::Delete { id } => found_or(store.delete(*id)?, *id),
        Command::Ping => Outcome::Done,
    };

    store.close()?;
    Ok(outcome)
}

fn found_or(changed: bool, id: RecordId) -> Outcome {
    if changed {
        Outcome::Done
    } else {
        Outcome::NotFound(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{run, Cli, Command, Outcome};
    use clap::{CommandFactory, Parser};

    fn cli_for(db: &std::path::Path, command: Command) -> Cli {
        Cli {
            db: db.to_path_buf(),
            log_dir: None,
            command,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_subcommand() {
        let cli = Cli::parse_from(["namebook", "--db", "x.db", "update", "3", "Bea"]);
        assert!(matches!(cli.command, Command::Update { id: 3, ref text } if text == "Bea"));
    }

    #[test]
    fn missing_id_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("names.db");

        let outcome = run(&cli_for(&db, Command::Delete { id: 42 })).unwrap();
        assert!(matches!(outcome, Outcome::NotFound(42)));

        let added = run(&cli_for(
            &db,
            Command::Add {
                text: "Ada".to_string(),
            },
        ))
        .unwrap();
        assert!(matches!(added, Outcome::Done));
        let deleted = run(&cli_for(&db, Command::Delete { id: 1 })).unwrap();
        assert!(matches!(deleted, Outcome::Done));
    }
}
