//! Subcommands and the per-invocation engine session they share.

pub mod dataset;
pub mod items;
pub mod tag;
pub mod version;

use clap::Args;
use dsvc_core::config::EngineConfig;
use dsvc_core::errors::ExError;
use dsvc_core::lock::DatasetLockService;
use dsvc_core::logging_facility;
use dsvc_core_types::CallerContext;
use dsvc_engine::{apply_engine_command, build_lock_service, EngineCommand, EngineCommandResult};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn Error>>;

const DEFAULT_CONFIG_PATH: &str = ".dsvc/config.toml";

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// SQLite store path (created and migrated on first use)
    #[arg(long, global = true, default_value = ".dsvc/store.db")]
    pub db: PathBuf,

    /// Engine configuration file; `.dsvc/config.toml` is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace the caller acts in
    #[arg(long, global = true, default_value = "default")]
    pub workspace: String,

    /// Recorded as `created_by` on commits and tags
    #[arg(long, global = true, default_value = "local")]
    pub user: String,
}

/// Everything one CLI invocation needs to run engine commands.
pub struct Session {
    conn: Connection,
    ctx: CallerContext,
    locks: Box<dyn DatasetLockService>,
    config: EngineConfig,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn Error>> {
        let config = match &global.config {
            Some(path) if !path.exists() => {
                return Err(format!("config file not found: {}", path.display()).into())
            }
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::load(&PathBuf::from(DEFAULT_CONFIG_PATH))?,
        };
        logging_facility::init(config.logging.profile);

        let conn = dsvc_store::db::open_store(&global.db)?;
        let locks = build_lock_service(&config.lock, &global.db)?;
        let ctx = CallerContext::new(global.workspace.clone(), global.user.clone());

        Ok(Self {
            conn,
            ctx,
            locks,
            config,
        })
    }

    pub fn run(&mut self, cmd: EngineCommand) -> Result<EngineCommandResult, ExError> {
        apply_engine_command(
            cmd,
            &self.ctx,
            &mut self.conn,
            self.locks.as_ref(),
            &self.config,
        )
    }
}

/// Open a session, run one command and print its result as JSON.
pub fn run_and_print(global: &GlobalArgs, cmd: EngineCommand) -> CliResult {
    let mut session = Session::open(global)?;
    let result = session.run(cmd)?;
    print_result(&result)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the payload of a result without the variant envelope
pub fn print_result(result: &EngineCommandResult) -> CliResult {
    match result {
        EngineCommandResult::Dataset(v) => print_json(v),
        EngineCommandResult::Datasets(v) => print_json(v),
        EngineCommandResult::DraftItems(v) => print_json(v),
        EngineCommandResult::Removed(n) => print_json(&serde_json::json!({ "removed": n })),
        EngineCommandResult::Version(v) => print_json(v),
        EngineCommandResult::Versions(v) => print_json(v),
        EngineCommandResult::Items(v) => print_json(v),
        EngineCommandResult::Tag(v) => print_json(v),
        EngineCommandResult::TagDeleted(b) => print_json(&serde_json::json!({ "deleted": b })),
        EngineCommandResult::Tags(v) => print_json(v),
        EngineCommandResult::Comparison(v) => print_json(v),
    }
}

/// Parse `key=value` into a pair
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("source=csv=v2").unwrap(),
            ("source".to_string(), "csv=v2".to_string())
        );
        assert_eq!(
            parse_key_value("note=").unwrap(),
            ("note".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
