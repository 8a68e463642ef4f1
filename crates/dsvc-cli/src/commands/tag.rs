//! Tag commands

use clap::{Args, Subcommand};
use dsvc_engine::EngineCommand;

use super::{run_and_print, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Tag a version (named by hash or an existing tag)
    Add {
        #[arg(long)]
        dataset: String,

        #[arg(long = "version")]
        version_ref: String,

        tag: String,
    },
    /// Remove a tag from a version; no-op if it is not there
    Rm {
        #[arg(long)]
        dataset: String,

        #[arg(long = "version")]
        version_hash: String,

        tag: String,
    },
    /// List the tags of a version
    List {
        #[arg(long)]
        dataset: String,

        #[arg(long = "version")]
        version_hash: String,
    },
}

pub fn execute(global: &GlobalArgs, args: TagArgs) -> CliResult {
    let cmd = match args.command {
        TagCommand::Add {
            dataset,
            version_ref,
            tag,
        } => EngineCommand::CreateTag {
            dataset_id: dataset,
            version_ref,
            tag,
        },
        TagCommand::Rm {
            dataset,
            version_hash,
            tag,
        } => EngineCommand::DeleteTag {
            dataset_id: dataset,
            version_hash,
            tag,
        },
        TagCommand::List {
            dataset,
            version_hash,
        } => EngineCommand::ListTags {
            dataset_id: dataset,
            version_hash,
        },
    };
    run_and_print(global, cmd)
}
