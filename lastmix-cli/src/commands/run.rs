//! The default command: arrange the given playlists and print the result.

use std::io;
use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use lastmix::config::ConfigFile;
use lastmix::logging::init_logging;
use lastmix::pipeline::{Pipeline, PipelineConfig, Preset, StrategyChoice};
use lastmix::rating::{RankProgress, RankProgressCallback};

use crate::error::CliError;

/// Arguments of a merge run.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Playlists to combine: M3U files or directories of MP3 files
    pub playlists: Vec<PathBuf>,

    /// Merge strategy (join, interleave, slide, shuffle, union, ...)
    #[arg(short, long, value_name = "NAME")]
    pub merge: Option<String>,

    /// Group strategy (none, artist, prefix)
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Sort order inside each group (playcount, listeners, none)
    #[arg(short, long, value_name = "NAME")]
    pub sort: Option<String>,

    /// Preset combination (norm, norm-prefix, normalize, normalize-prefix)
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Also write the playlist to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Last.fm API key (also LASTMIX_API_KEY or config.ini)
    #[arg(short = 'a', long = "api", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Write entries relative to this directory
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Seed for the random strategies, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Configuration file (default: ~/.lastmix/config.ini)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write log output to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Do not show a progress bar while looking up ratings
    #[arg(long)]
    pub no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Builds the pipeline configuration from arguments and the config file.
///
/// Precedence for each strategy: command line, then preset, then the
/// `[defaults]` section of the config file.
pub fn resolve_config(args: &RunArgs, file: &ConfigFile) -> Result<PipelineConfig, CliError> {
    let mut choice = StrategyChoice::parse(
        args.merge.as_deref(),
        args.group.as_deref(),
        args.sort.as_deref(),
    )?;

    if let Some(name) = &args.preset {
        let preset: Preset = name.parse()?;
        choice = choice.or(preset.choice());
    }

    let defaults = &file.defaults;
    choice = choice.or(StrategyChoice::parse(
        defaults.merge.as_deref(),
        defaults.group.as_deref(),
        defaults.order.as_deref(),
    )?);

    Ok(PipelineConfig::from_choice(choice)
        .with_api_key(file.resolve_api_key(args.api_key.as_deref()))
        .with_attempts(file.lastfm.attempt_policy())
        .with_pacing(file.lastfm.pacing())
        .with_output(args.output.clone())
        .with_base_dir(args.base_dir.clone().or_else(|| defaults.base_dir.clone())))
}

/// Runs the pipeline and prints the playlist to standard output.
pub fn run(args: &RunArgs) -> Result<(), CliError> {
    if args.playlists.is_empty() {
        return Err(CliError::Usage(
            "no playlists given; pass one or more M3U files or directories".to_string(),
        ));
    }

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };
    let log_file = args.log_file.clone().or_else(|| file.logging.file.clone());
    let _guard = init_logging(args.verbose, log_file.as_deref())?;

    let config = resolve_config(args, &file)?;
    info!(
        merge = %config.merge,
        group = %config.group,
        order = %config.order,
        api = config.api_key.is_some(),
        "Starting"
    );

    let progress = (config.order.needs_ratings() && !args.no_progress).then(progress_bar);
    let mut pipeline = Pipeline::new(config)?;
    if let Some(bar) = &progress {
        pipeline = pipeline.with_progress(progress_callback(bar.clone()));
    }

    let mut rng = match args.seed {
        Some(seed) => {
            debug!(seed, "Using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let result = pipeline.run(&args.playlists, &mut io::stdout().lock(), &mut rng);
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    let tracks = result?;
    info!(tracks = tracks.len(), "Done");
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

fn progress_callback(bar: ProgressBar) -> RankProgressCallback {
    Box::new(move |progress: &RankProgress<'_>| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.position as u64);
        bar.set_message(format!(
            "{} - {}",
            progress.rating.artist, progress.rating.title
        ));
    })
}
