//! towerstim command line.
//!
//! ```bash
//! # Render every configured dataset (skips finished stimuli)
//! towerstim render
//!
//! # Render one dataset with a custom config, without touching the disk
//! towerstim --config run.json render --dataset willitfall --dry-run
//!
//! # Print the seed for a stimulus
//! towerstim seed tower_00
//!
//! # Show what a dataset contains and what is already rendered
//! towerstim list willitfall
//!
//! # Write the default config for editing
//! towerstim init-config run.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use towerstim::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Tower stimulus generator
#[derive(Parser, Debug)]
#[command(name = "towerstim")]
#[command(author, version, about = "Render tower-of-blocks stimuli through a host 3D engine", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run configuration (JSON). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render datasets
    Render {
        /// Dataset to render (repeatable). All configured datasets if omitted.
        #[arg(short, long)]
        dataset: Vec<String>,

        /// Record engine calls without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the seed derived from each stimulus name
    Seed {
        names: Vec<String>,
    },

    /// List a dataset's stimuli and their render status
    List {
        dataset: String,
    },

    /// Write the default configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };

    match cli.command {
        Commands::Render { dataset, dry_run } => render(config, &dataset, dry_run)?,
        Commands::Seed { names } => {
            for name in names {
                println!("{}\t{}", name, Seed::from_name(&name));
            }
        }
        Commands::List { dataset } => list(&config, &dataset)?,
        Commands::InitConfig { path } => {
            config.save(&path)?;
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn render(config: RunConfig, datasets: &[String], dry_run: bool) -> anyhow::Result<()> {
    info!("towerstim v{}", env!("CARGO_PKG_VERSION"));

    let summary = if dry_run {
        let mut driver = Driver::new(RecordingEngine::scene_only(), config)?;
        let summary = run(&mut driver, datasets)?;
        info!("Dry run recorded {} engine calls", driver.engine().total_calls());
        summary
    } else {
        let engine = ManifestEngine::new().with_command(config.render_command.clone());
        let mut driver = Driver::new(engine, config)?;
        run(&mut driver, datasets)?
    };

    info!("Done: {} rendered, {} skipped", summary.rendered, summary.skipped);
    Ok(())
}

fn run<E: HostEngine>(driver: &mut Driver<E>, datasets: &[String]) -> Result<RunSummary, DriverError> {
    if datasets.is_empty() {
        driver.run()
    } else {
        driver.run_datasets(datasets)
    }
}

fn list(config: &RunConfig, dataset: &str) -> anyhow::Result<()> {
    let table = StimulusTable::load(config.table_path(dataset))?;
    for name in table.names() {
        for ratio in table.ratios(name) {
            let output = config.output_dir(dataset, name, ratio.as_deref());
            let spec = table.spec(name, ratio.as_deref())?;
            let status = if output.exists() { "done" } else { "pending" };
            println!(
                "{}\t{}\t{} blocks\tseed {}\t{}",
                name,
                ratio.as_deref().unwrap_or("-"),
                spec.len(),
                Seed::from_name(name),
                status
            );
        }
    }
    Ok(())
}
