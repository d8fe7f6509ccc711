mod checkout;
mod commands;
mod config;
mod error;
mod hash;
mod objects;
mod pack;
mod pktline;
mod refs;
mod transport;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv). Overridden by RUST_LOG if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a remote repository over the smart-HTTP transport
    Clone {
        /// Repository URL
        repository: String,

        /// Destination directory (defaults to the repository's last path segment)
        directory: Option<PathBuf>,
    },

    /// Provide content or type and size information for a stored object
    CatFile {
        /// Repository directory to read the object store from
        #[arg(short = 'C', long = "repo", default_value = ".")]
        repo_dir: PathBuf,

        /// Show object type
        #[arg(short = 't', conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short = 's', conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short = 'p', conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Clone { repository, directory } => commands::clone::invoke(&repository, directory),
        Commands::CatFile {
            repo_dir,
            pretty_print: _,
            type_only,
            size_only,
            hash,
        } => commands::cat_file::invoke(&repo_dir, &hash, type_only, size_only),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
