//! photo_manager - Command-line interface for the photo catalogue.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use photo_core::PhotoConfig;
use photo_query::{find_photos, TagQuery};
use photo_scan::{Blake3Digest, Reconciler};
use photo_store::PhotoStore;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Tag, search and keep track of a photo collection
#[derive(Parser, Debug)]
#[command(name = "photo_manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalogue file (created by the first scan)
    database: PathBuf,

    /// Root of the photo tree
    image_dir: PathBuf,

    /// Configuration file (default: <config dir>/photo-manager/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse and tag photos in the terminal
    Gui {
        /// Index of the first photo to show
        start: Option<usize>,
    },

    /// Add new photos and follow moved ones
    Scan,

    /// List photos carrying every given tag
    Search {
        /// Tag names; separate tags with a lone `-`
        #[arg(required = true)]
        tags: Vec<String>,

        /// Print paths as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show catalogue statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(external_subcommand)]
    Other(Vec<String>),
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let failed = e.use_stderr();
            e.print().ok();
            return if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    setup_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the catalogue, run the command, and write the catalogue back.
///
/// The catalogue is rewritten even when the command fails, so a failed
/// search still upgrades legacy lines. Returns whether the command succeeded.
fn run(cli: Cli) -> CliResult<bool> {
    let config = PhotoConfig::resolve(cli.config.as_deref())?;
    let (mut store, report) = PhotoStore::open(&cli.database)?;
    if !report.warnings.is_empty() {
        eprintln!(
            "Warning: skipped {} damaged line(s) in {}",
            report.warnings.len(),
            cli.database.display()
        );
    }
    if report.lossy {
        eprintln!(
            "Warning: {} is not valid UTF-8; keeping the original as a backup",
            cli.database.display()
        );
    }

    let mut stdout = io::stdout();
    let outcome = execute(&cli.command, &mut store, &cli.image_dir, &config, &mut stdout);

    store.save(&cli.database, config.database.backup || report.lossy)?;

    match outcome {
        Ok(()) => Ok(true),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}

fn execute(
    command: &Commands,
    store: &mut PhotoStore,
    image_dir: &Path,
    config: &PhotoConfig,
    out: &mut impl Write,
) -> CliResult<()> {
    debug!("Running {:?}", command);

    match command {
        Commands::Gui { start } => {
            photo_tui::run(store, image_dir, start.unwrap_or(0), &config.viewer)?;
        }
        Commands::Scan => scan(store, image_dir, config, out)?,
        Commands::Search { tags, json } => search(store, image_dir, tags, *json, out)?,
        Commands::Stats { json } => stats(store, *json, out)?,
        Commands::Other(args) => {
            let name = args.first().map(String::as_str).unwrap_or_default();
            writeln!(out, "Unknown command: {}", name)?;
        }
    }

    Ok(())
}

fn scan(store: &mut PhotoStore, image_dir: &Path, config: &PhotoConfig, out: &mut impl Write) -> CliResult<()> {
    let reconciler = Reconciler::new(Blake3Digest, config.scan.clone());
    let report = reconciler.scan(image_dir, store)?;

    writeln!(
        out,
        "Scanned {} file(s): {} new, {} moved, {} unchanged, {} duplicate(s), {} skipped",
        report.candidates,
        report.added,
        report.relocated,
        report.unchanged,
        report.duplicates,
        report.skipped.len()
    )?;
    for skipped in &report.skipped {
        writeln!(out, "  skipped {}: {}", skipped.path.display(), skipped.reason)?;
    }

    Ok(())
}

fn search(
    store: &PhotoStore,
    image_dir: &Path,
    tags: &[String],
    json: bool,
    out: &mut impl Write,
) -> CliResult<()> {
    let query = TagQuery::from_words(tags)?;
    let paths: Vec<String> = find_photos(store, &query)?
        .into_iter()
        .map(|photo| photo.display_path(image_dir).display().to_string())
        .collect();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&paths)?)?;
    } else {
        for path in &paths {
            writeln!(out, "{}", path)?;
        }
    }

    Ok(())
}

fn stats(store: &PhotoStore, json: bool, out: &mut impl Write) -> CliResult<()> {
    let stats = store.stats();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
        return Ok(());
    }

    writeln!(out, "Photos:   {}", stats.photos)?;
    writeln!(out, "Concepts: {}", stats.concepts)?;
    writeln!(out, "Tagged:   {}", stats.tagged)?;
    writeln!(out, "Done:     {}", stats.done)?;
    writeln!(out, "Starred:  {}", stats.starred)?;
    writeln!(out, "Pending:  {}", stats.pending)?;
    if !stats.usage.is_empty() {
        writeln!(out)?;
        for usage in &stats.usage {
            writeln!(out, "  {:<24} {}", usage.name, usage.photos)?;
        }
    }

    Ok(())
}
