/*!
# Flydra odor-response analysis

Post-processing of 3D trajectories recorded by a multi-camera insect
tracking rig during timed odor (CO2) stimulation experiments.

## Features

- Time-window and tracking-volume filtering of raw trajectory samples
- Labelling of every sample with its stimulus phase (AIR, CO2, POST_CO2)
- Normalised X-Y / X-Z occupancy heatmaps per experiment and per phase
- Grouped heatmaps with cue-side flipping and anchor alignment
- Per-phase flight activity (trajectory count and summed duration)

## Modules

- [`experiment`] - Experiment records, sample arrays and filtering stages
- [`heatmap`] - Density grids and heatmap sinks
- [`alignment`] - Cue-side grouping and alignment offsets
- [`aggregate`] - Pooling samples across experiments
- [`activity`] - Flight activity estimation
- [`pipeline`] - Batch driver
- [`common`] - Constants and synthetic data generation

## Example

```rust,no_run
use std::path::Path;

use flydra_odor_analysis::{BatchPipeline, CsvSampleReader, JsonHeatmapSink, RunConfig};

let config = RunConfig::load(Path::new("ExpMetaData.yaml")).unwrap();
let reader = CsvSampleReader::new(&config.in_path);
let sink = JsonHeatmapSink::new(&config.out_path);

let mut pipeline = BatchPipeline::new(config, reader, sink).unwrap();
let experiments = pipeline.discover().unwrap();
let summary = pipeline.run_heatmaps(&experiments).unwrap();
println!("{} experiments, {} skipped", summary.processed_count(), summary.skipped_count());
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Experiment records and the filtering / labelling stages
pub mod experiment;

/// Density grids and heatmap artifacts
pub mod heatmap;

/// Cue-side grouping and alignment offsets
pub mod alignment;

/// Pooling one phase across experiments
pub mod aggregate;

/// Per-phase flight activity
pub mod activity;

/// Batch driver
pub mod pipeline;

// ============================================================================
// Supporting modules
// ============================================================================

/// Constants and synthetic data
pub mod common;

pub mod config;
pub mod errors;
pub mod io;
pub mod reporter;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Data model
pub use experiment::{
    load_experiment_config, ExperimentConfig, ExperimentRecord, Phase, PhaseBoundaries,
    PhaseCounts, SampleArrays, SpatialBounds, TrajectorySample,
};

// Heatmaps
pub use heatmap::{
    BinCount, DensityGrid, HeatmapArtifact, HeatmapSink, JsonHeatmapSink, MemorySink,
    PlaneDensities,
};

// Grouping
pub use aggregate::{Aggregator, GroupedSamples};
pub use alignment::{AlignmentOffset, AnchorProvider, AnchorTable, CueSide, NoAnchors};

// Activity
pub use activity::{ActivityEstimate, ActivityEstimator, PhaseActivity};

// Configuration, IO and errors
pub use config::RunConfig;
pub use errors::{AnalysisError, Result};
pub use io::{CsvSampleReader, SampleReader};

// Batch driver
pub use pipeline::{BatchPipeline, BatchSummary, GroupOutcome, SkippedExperiment};
pub use reporter::{DebugReporter, LoggingReporter, NoOpReporter, PipelineReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
