//! Version commands: commit, list, show, items, compare, restore, update

use clap::{Args, Subcommand};
use dsvc_engine::{CommitRequest, EngineCommand, EngineCommandResult, PageRequest, VersionUpdate};
use std::collections::BTreeMap;

use super::{parse_key_value, print_result, run_and_print, CliResult, GlobalArgs, Session};

#[derive(Debug, Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub command: VersionCommand,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size; the configured default when omitted
    #[arg(long)]
    pub size: Option<u32>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            size: self.size,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum VersionCommand {
    /// Commit the draft as a new version
    Commit {
        #[arg(long)]
        dataset: String,

        /// Change description
        #[arg(long, short = 'm')]
        message: Option<String>,

        /// Extra tag for the new version
        #[arg(long)]
        tag: Option<String>,

        /// Metadata entry as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },
    /// List versions, newest first
    List {
        #[arg(long)]
        dataset: String,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Show one version by tag or hash
    Show {
        #[arg(long)]
        dataset: String,

        reference: String,
    },
    /// Page through the items of a version, or the draft
    Items {
        #[arg(long)]
        dataset: String,

        /// Tag, hash or `draft`; the draft when omitted
        #[arg(long = "ref")]
        reference: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Compare two references
    Compare {
        #[arg(long)]
        dataset: String,

        #[arg(long)]
        from: String,

        /// Defaults to the draft
        #[arg(long)]
        to: Option<String>,

        /// Print the Markdown summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Replace the draft with a version's items
    Restore {
        #[arg(long)]
        dataset: String,

        reference: String,
    },
    /// Update description, metadata or tags of a version
    Update {
        #[arg(long)]
        dataset: String,

        reference: String,

        #[arg(long, short = 'm')]
        message: Option<String>,

        /// Replaces all metadata when given (repeatable key=value)
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,

        /// Tag to add (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

pub fn execute(global: &GlobalArgs, args: VersionArgs) -> CliResult {
    let cmd = match args.command {
        VersionCommand::Commit {
            dataset,
            message,
            tag,
            metadata,
        } => EngineCommand::Commit(CommitRequest {
            dataset_id: dataset,
            change_description: message,
            metadata: metadata.into_iter().collect(),
            tag,
        }),
        VersionCommand::List { dataset, paging } => EngineCommand::ListVersions {
            dataset_id: dataset,
            page: paging.request(),
        },
        VersionCommand::Show { dataset, reference } => EngineCommand::RetrieveVersion {
            dataset_id: dataset,
            name: reference,
        },
        VersionCommand::Items {
            dataset,
            reference,
            paging,
        } => EngineCommand::GetItems {
            dataset_id: dataset,
            reference,
            page: paging.request(),
        },
        VersionCommand::Compare {
            dataset,
            from,
            to,
            summary,
        } => {
            return execute_compare(global, dataset, from, to, summary);
        }
        VersionCommand::Restore { dataset, reference } => EngineCommand::Restore {
            dataset_id: dataset,
            reference,
        },
        VersionCommand::Update {
            dataset,
            reference,
            message,
            metadata,
            tags,
        } => EngineCommand::UpdateVersion {
            dataset_id: dataset,
            reference,
            update: VersionUpdate {
                change_description: message,
                metadata: (!metadata.is_empty())
                    .then(|| metadata.into_iter().collect::<BTreeMap<_, _>>()),
                tags_to_add: tags,
            },
        },
    };
    run_and_print(global, cmd)
}

fn execute_compare(
    global: &GlobalArgs,
    dataset_id: String,
    from: String,
    to: Option<String>,
    summary: bool,
) -> CliResult {
    let mut session = Session::open(global)?;
    let result = session.run(EngineCommand::Compare {
        dataset_id,
        from: Some(from),
        to,
    })?;
    match result {
        EngineCommandResult::Comparison(cmp) if summary => {
            print!("{}", cmp.summary());
            Ok(())
        }
        other => print_result(&other),
    }
}
