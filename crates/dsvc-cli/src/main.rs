//! dsvc CLI
//!
//! Command-line interface for dataset version control

use clap::{Parser, Subcommand};

mod commands;

use commands::GlobalArgs;

#[derive(Debug, Parser)]
#[command(name = "dsvc")]
#[command(about = "dsvc - Version control for evaluation datasets", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dataset registry
    Dataset(commands::dataset::DatasetArgs),
    /// Draft item editing
    Items(commands::items::ItemsArgs),
    /// Commit, inspect, compare and restore versions
    Version(commands::version::VersionArgs),
    /// Tag management
    Tag(commands::tag::TagArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dataset(args) => commands::dataset::execute(&cli.global, args),
        Commands::Items(args) => commands::items::execute(&cli.global, args),
        Commands::Version(args) => commands::version::execute(&cli.global, args),
        Commands::Tag(args) => commands::tag::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
