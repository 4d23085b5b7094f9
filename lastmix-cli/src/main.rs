//! lastmix CLI - Command-line interface
//!
//! Combines playlists with the lastmix library and prints the result to
//! standard output. Diagnostics and progress go to standard error.

mod commands;
mod error;

use clap::Parser;

use commands::run::RunArgs;
use error::CliError;

/// Merge, group and sort M3U playlists, optionally by Last.fm popularity.
#[derive(Debug, Parser)]
#[command(name = "lastmix", version, about)]
#[command(after_help = "With no options, playlists are joined and sorted by \
    Last.fm play count. Choosing only a merge groups by artist; choosing only \
    a group merges with a 5x5 sliding window; choosing only a sort groups by \
    folder and slides.")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// List every accepted merge, group, sort and preset name
    #[arg(long)]
    list_strategies: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = if cli.list_strategies {
        commands::strategies::run().map_err(|e| CliError::Usage(e.to_string()))
    } else {
        commands::run::run(&cli.run)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
