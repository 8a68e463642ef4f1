//! Dataset registry commands

use clap::{Args, Subcommand};
use dsvc_engine::EngineCommand;

use super::{run_and_print, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct DatasetArgs {
    #[command(subcommand)]
    pub command: DatasetCommand,
}

#[derive(Debug, Subcommand)]
pub enum DatasetCommand {
    /// Create a dataset in the current workspace
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,
    },
    /// List datasets in the current workspace
    List,
    /// Show one dataset
    Show {
        #[arg(long)]
        id: String,
    },
}

pub fn execute(global: &GlobalArgs, args: DatasetArgs) -> CliResult {
    let cmd = match args.command {
        DatasetCommand::Create { name, description } => {
            EngineCommand::CreateDataset { name, description }
        }
        DatasetCommand::List => EngineCommand::ListDatasets,
        DatasetCommand::Show { id } => EngineCommand::GetDataset { dataset_id: id },
    };
    run_and_print(global, cmd)
}
