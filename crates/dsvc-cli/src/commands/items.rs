//! Draft item commands
//!
//! `put` reads a JSON array of `{"id"?: string, "data": object}` entries.
//! Entries without an id become new items.

use clap::{Args, Subcommand};
use dsvc_core::model::NewDraftItem;
use dsvc_engine::EngineCommand;
use std::path::{Path, PathBuf};

use super::{run_and_print, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// Insert or replace draft items from a JSON file
    Put {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        file: PathBuf,
    },
    /// Delete draft items by id
    Delete {
        #[arg(long)]
        dataset: String,

        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },
    /// List the whole draft
    List {
        #[arg(long)]
        dataset: String,
    },
}

fn read_items(path: &Path) -> Result<Vec<NewDraftItem>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let items: Vec<NewDraftItem> = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not a JSON array of items: {}", path.display(), e))?;
    Ok(items)
}

pub fn execute(global: &GlobalArgs, args: ItemsArgs) -> CliResult {
    let cmd = match args.command {
        ItemsCommand::Put { dataset, file } => EngineCommand::UpsertDraftItems {
            dataset_id: dataset,
            items: read_items(&file)?,
        },
        ItemsCommand::Delete { dataset, ids } => EngineCommand::DeleteDraftItems {
            dataset_id: dataset,
            ids,
        },
        ItemsCommand::List { dataset } => EngineCommand::ListDraftItems {
            dataset_id: dataset,
        },
    };
    run_and_print(global, cmd)
}
