//! Command-line entry point
//!
//! ```text
//! flydra-analysis heatmaps                 # per-experiment heatmaps, all phases
//! flydra-analysis group --anchors a.yaml   # grouped heatmap of ODOR
//! flydra-analysis activity                 # per-phase flight activity
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use flydra_odor_analysis::{
    AnalysisError, AnchorTable, BatchPipeline, BatchSummary, BinCount, CsvSampleReader,
    JsonHeatmapSink, LoggingReporter, NoAnchors, RunConfig,
};

/// Trajectory analysis of Flydra odor-response experiments
#[derive(Parser, Debug)]
#[command(name = "flydra-analysis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run configuration file
    #[arg(short, long, global = true, default_value = "ExpMetaData.yaml")]
    config: PathBuf,

    /// Override IN_PATH
    #[arg(long, global = true)]
    in_path: Option<PathBuf>,

    /// Override OUT_PATH
    #[arg(long, global = true)]
    out_path: Option<PathBuf>,

    /// Override NBINS, e.g. `--bins 600 200`
    #[arg(long, global = true, num_args = 2, value_names = ["X", "Y"])]
    bins: Option<Vec<usize>>,

    /// Pretty-print heatmap JSON
    #[arg(long, global = true)]
    pretty: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Heatmaps of every experiment for AIR, CO2 and POST_CO2
    Heatmaps,

    /// Grouped heatmap of the ODOR phase across experiments
    Group {
        /// YAML or JSON map of expDate -> [x, y] alignment anchors
        #[arg(short, long)]
        anchors: Option<PathBuf>,
    },

    /// Trajectory counts and flight time per phase
    Activity {
        /// Override MIN_FLIGHT_TIME (seconds)
        #[arg(long)]
        min_flight_time: Option<f64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli) {
        Ok(summary) => {
            info!(
                "Done: {} experiments processed, {} skipped",
                summary.processed_count(),
                summary.skipped_count()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<BatchSummary, AnalysisError> {
    let mut config = RunConfig::load(&cli.config)?;
    if let Some(in_path) = cli.in_path {
        config.in_path = in_path;
    }
    if let Some(out_path) = cli.out_path {
        config.out_path = out_path;
    }
    if let Some(&[x, y]) = cli.bins.as_deref() {
        config.bins = BinCount::new(x, y);
    }
    if let Commands::Activity {
        min_flight_time: Some(t),
    } = cli.command
    {
        config.min_flight_time = t;
    }

    let reader = CsvSampleReader::new(&config.in_path);
    let sink = JsonHeatmapSink::new(&config.out_path).pretty(cli.pretty);
    let mut pipeline = BatchPipeline::new(config, reader, sink)?.with_reporter(LoggingReporter::new());

    let experiments = pipeline.discover()?;
    info!(
        "Found {} experiment configurations in {}",
        experiments.len(),
        pipeline.config().in_path.display()
    );

    match cli.command {
        Commands::Heatmaps => pipeline.run_heatmaps(&experiments),
        Commands::Group { anchors: Some(path) } => {
            let mut table = AnchorTable::load(&path)?;
            info!("Loaded {} alignment anchors from {}", table.len(), path.display());
            pipeline.run_group(&experiments, &mut table)
        }
        Commands::Group { anchors: None } => pipeline.run_group(&experiments, &mut NoAnchors),
        Commands::Activity { .. } => {
            let summary = pipeline.run_activity(&experiments)?;
            let responders = summary.responders();
            info!(
                "{} of {} experiments fly more during CO2 than during AIR: {:?}",
                responders.len(),
                summary.activities.len(),
                responders
            );
            Ok(summary)
        }
    }
}
