//! ADL Quantiser CLI
//!
//! Turns recorded sensor event logs into labelled feature vectors.

use adl_quantiser::{
    collector::SensorCategory,
    config::Config,
    core::{EventIndex, Quantiser, SensorRegistry, WindowDuration},
    io::{read_bookmarks_csv, read_events_csv, write_events_csv, write_vectors_to_path},
    session::Session,
    stats::create_shared_log_with_persistence,
    FeatureVector, VERSION,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adl-quantise")]
#[command(version = VERSION)]
#[command(about = "Quantise smart-home sensor logs into labelled feature vectors", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantise an event CSV into feature vectors
    Quantise {
        /// Event CSV with one reading per row
        input: PathBuf,

        /// Output file (overrides the configured path)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Window length in seconds (overrides the configured window)
        #[arg(long)]
        window_secs: Option<u32>,

        /// Only quantise this bookmark (requires --session)
        #[arg(long, requires = "session")]
        bookmark: Option<String>,

        /// Only quantise this session (requires --bookmark)
        #[arg(long, requires = "bookmark")]
        session: Option<i64>,

        /// JSON file listing the output sensors in order
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Do not write a header row
        #[arg(long)]
        no_header: bool,

        /// Replace the output file instead of appending
        #[arg(long)]
        overwrite: bool,
    },

    /// Summarise the bookmarks, sessions and sensors in an event CSV
    Inspect {
        /// Event CSV with one reading per row
        input: PathBuf,
    },

    /// Tag a raw session log with bookmark time ranges
    Tag {
        /// Event CSV recorded during one session
        events: PathBuf,

        /// Bookmark CSV with name,start_time,end_time columns
        bookmarks: PathBuf,

        /// Session id written into every tagged row
        #[arg(long)]
        session: i64,

        /// Output event CSV
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Quantise {
            input,
            output,
            window_secs,
            bookmark,
            session,
            registry,
            no_header,
            overwrite,
        } => {
            let mut config = config;
            if let Some(secs) = window_secs {
                config.window = WindowDuration::from_secs(secs);
            }
            if let Some(path) = output {
                config.output.path = path;
            }
            if let Some(path) = registry {
                config.registry = load_registry(&path)?;
            }
            if no_header {
                config.output.include_headers = false;
            }
            if overwrite {
                config.output.append = false;
            }
            let selected = bookmark.zip(session);
            cmd_quantise(&config, &input, selected)
        }
        Commands::Inspect { input } => cmd_inspect(&config, &input),
        Commands::Tag {
            events,
            bookmarks,
            session,
            output,
        } => cmd_tag(&events, &bookmarks, session, &output),
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), init),
    }
}

/// Logs go to stderr; `RUST_LOG` wins unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

fn load_registry(path: &Path) -> Result<SensorRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid registry file {}", path.display()))
}

fn cmd_quantise(config: &Config, input: &Path, selected: Option<(String, i64)>) -> Result<()> {
    if config.window.is_zero() {
        bail!("Window duration must be greater than zero");
    }

    let events = read_events_csv(input)
        .with_context(|| format!("Failed to read events from {}", input.display()))?;

    let stats = create_shared_log_with_persistence(config.stats_path());
    let index = EventIndex::from_events(events);
    stats.record_events_indexed(index.event_count() as u64);

    let registry = config.registry_for(&index);
    if registry.is_empty() {
        bail!("No sensors to quantise: the registry is empty and the input has no events");
    }

    let quantiser = Quantiser::new(registry, config.reduction.clone(), config.window)
        .with_stats(stats.clone());

    let vectors: Vec<FeatureVector> = match selected {
        Some((bookmark, session_id)) => {
            tracing::info!(%bookmark, session_id, "Quantising selected session");
            quantiser.quantise_selected(&index, &bookmark, session_id)
        }
        None => quantiser
            .quantise_all(&index)
            .into_iter()
            .flat_map(|q| q.vectors)
            .collect(),
    };

    if vectors.is_empty() {
        println!("No feature vectors produced; nothing written.");
    } else {
        let written = write_vectors_to_path(
            &config.output.path,
            quantiser.registry(),
            &vectors,
            config.output.write_options(),
        )
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;
        stats.record_vectors_written(written as u64);

        println!(
            "Wrote {written} feature vectors ({} columns, window {}) to {}",
            quantiser.registry().len(),
            config.window,
            config.output.path.display()
        );
    }

    if let Err(e) = stats.save() {
        tracing::warn!("Could not save run statistics: {e}");
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn cmd_inspect(config: &Config, input: &Path) -> Result<()> {
    let events = read_events_csv(input)
        .with_context(|| format!("Failed to read events from {}", input.display()))?;
    let index = EventIndex::from_events(events);

    println!("Event Log Summary");
    println!("=================");
    println!();
    println!("File: {}", input.display());
    println!("Events: {}", index.event_count());
    println!();

    println!("Bookmarks:");
    if index.bookmark_names().is_empty() {
        println!("  (none)");
    }
    for name in index.bookmark_names() {
        let sessions = index.sessions_for_bookmark(name).unwrap_or_default();
        let label = if name.is_empty() { "(untagged)" } else { name.as_str() };
        println!("  {label}: sessions {sessions:?}");
    }
    println!();

    println!("Sensors by category:");
    for category in SensorCategory::ALL {
        println!(
            "  {:<15} {:>4} sensors {:>8} events",
            category.as_str(),
            index.sensor_count_for_category(category),
            index.event_count_for_category(category)
        );
    }
    println!();

    let registry = config.registry_for(&index);
    println!("Output columns ({}):", registry.len());
    for spec in registry.sensors() {
        let observed = index.events_for_sensor(&spec.name).map_or(0, |e| e.len());
        println!("  {} [{}] {} events", spec.name, spec.category, observed);
    }

    Ok(())
}

fn cmd_tag(events_path: &Path, bookmarks_path: &Path, session_id: i64, output: &Path) -> Result<()> {
    let events = read_events_csv(events_path)
        .with_context(|| format!("Failed to read events from {}", events_path.display()))?;
    let bookmarks = read_bookmarks_csv(bookmarks_path)
        .with_context(|| format!("Failed to read bookmarks from {}", bookmarks_path.display()))?;

    let session = Session::new(session_id, events, bookmarks);
    let tagged = session.tagged_events();
    let written = write_events_csv(output, &tagged)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Tagged {written} events across {} bookmarks into {}",
        session.bookmarks.len(),
        output.display()
    );
    Ok(())
}

fn cmd_config(config: &Config, explicit: Option<&Path>, init: bool) -> Result<()> {
    let path = explicit.map_or_else(Config::config_path, Path::to_path_buf);

    if init {
        config
            .save_to(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {}", path.display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
