//! Batch driver
//!
//! [`BatchPipeline`] runs the three analyses over every experiment in a
//! batch:
//!
//! - [`run_heatmaps`](BatchPipeline::run_heatmaps): per-experiment heatmaps for all phases
//! - [`run_group`](BatchPipeline::run_group): side-flip, align and pool one phase into a grouped heatmap
//! - [`run_activity`](BatchPipeline::run_activity): per-phase flight activity
//!
//! Experiments are processed one at a time. A failure while loading or
//! labelling an experiment skips that experiment only; a failure writing a
//! heatmap is reported and the run continues.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::activity::{ActivityEstimate, ActivityEstimator};
use crate::aggregate::Aggregator;
use crate::alignment::{AlignmentOffset, AnchorProvider};
use crate::config::RunConfig;
use crate::errors::{AnalysisError, Result};
use crate::experiment::{load_experiment_config, ExperimentRecord, Phase};
use crate::heatmap::{HeatmapArtifact, HeatmapSink, PlaneDensities};
use crate::io::{find_experiment_configs, SampleReader};
use crate::reporter::{FilterStage, NoOpReporter, PipelineReporter};

/// Extension of experiment configuration files
pub const EXPERIMENT_CONFIG_EXTENSION: &str = "yaml";

// ============================================================================
// Outputs
// ============================================================================

/// Experiment (or artifact) left out of a run, with the reason
#[derive(Debug)]
pub struct SkippedExperiment {
    /// Configuration file, or artifact name for render failures
    pub source: String,
    pub error: AnalysisError,
}

/// Result of the grouped analysis
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    /// Grouped artifact name
    pub name: String,
    pub phase: Phase,
    /// Experiments pooled, with their sample counts, in order
    pub experiments: Vec<(String, usize)>,
    /// Pooled sample count
    pub samples: usize,
    /// Where the sink stored the artifact, if it succeeded
    pub path: Option<PathBuf>,
}

/// What a batch run did
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Experiments that made it through loading and labelling, in order
    pub processed: Vec<String>,
    /// Experiments skipped (and artifacts not written)
    pub skipped: Vec<SkippedExperiment>,
    /// Artifacts written, with their locations
    pub written: Vec<(String, PathBuf)>,
    /// Activity per experiment, in processing order
    pub activities: Vec<(String, ActivityEstimate)>,
    pub group: Option<GroupOutcome>,
}

impl BatchSummary {
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Experiments whose CO2 flight time exceeds their AIR flight time
    pub fn responders(&self) -> Vec<&str> {
        self.activities
            .iter()
            .filter(|(_, a)| a.shows_co2_response())
            .map(|(date, _)| date.as_str())
            .collect()
    }
}

// ============================================================================
// BatchPipeline
// ============================================================================

/// Drives a batch of experiments through loading, filtering and analysis.
///
/// # Type Parameters
/// * `R` - Raw sample source
/// * `S` - Heatmap destination
/// * `P` - Reporter receiving progress callbacks
pub struct BatchPipeline<R: SampleReader, S: HeatmapSink, P: PipelineReporter = NoOpReporter> {
    config: RunConfig,
    reader: R,
    sink: S,
    reporter: P,
}

impl<R: SampleReader, S: HeatmapSink> BatchPipeline<R, S, NoOpReporter> {
    /// Pipeline with a validated run configuration and no reporter.
    ///
    /// Fails with [`AnalysisError::Configuration`] if the configuration is
    /// unusable; nothing is processed in that case.
    pub fn new(config: RunConfig, reader: R, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reader,
            sink,
            reporter: NoOpReporter,
        })
    }
}

impl<R: SampleReader, S: HeatmapSink, P: PipelineReporter> BatchPipeline<R, S, P> {
    /// Replace the reporter
    pub fn with_reporter<Q: PipelineReporter>(self, reporter: Q) -> BatchPipeline<R, S, Q> {
        BatchPipeline {
            config: self.config,
            reader: self.reader,
            sink: self.sink,
            reporter,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut P {
        &mut self.reporter
    }

    pub fn into_parts(self) -> (RunConfig, R, S, P) {
        (self.config, self.reader, self.sink, self.reporter)
    }

    /// Experiment configuration files under `IN_PATH`, sorted by name
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        find_experiment_configs(&self.config.in_path, EXPERIMENT_CONFIG_EXTENSION)
    }

    // ------------------------------------------------------------------------
    // Per-experiment preparation
    // ------------------------------------------------------------------------

    /// Load one experiment and take it through every filtering stage:
    /// configuration, raw samples, time window, tracking volume, phase labels.
    pub fn prepare_experiment(&mut self, config_path: &Path) -> Result<ExperimentRecord> {
        let started = Instant::now();
        let exp_config = load_experiment_config(config_path)?;
        let exp_date = exp_config.exp_date.clone();
        self.reporter.on_config_loaded(&exp_date, config_path);

        let samples = self
            .reader
            .read(&exp_config.file_name, &self.config.dataset)?;
        let raw = samples.len();
        self.reporter.on_samples_loaded(&exp_date, raw);

        let record = ExperimentRecord::from_config(exp_config)
            .with_samples(samples)
            .apply_start_end_ts()?;
        let in_window = record.len();
        self.reporter
            .on_filtered(&exp_date, FilterStage::TimeWindow, raw, in_window);

        let record = record.erase_pos_outside_wt(&self.config.spatial_bounds())?;
        self.reporter.on_filtered(
            &exp_date,
            FilterStage::TrackingVolume,
            in_window,
            record.len(),
        );

        let record = record.set_odor_stim()?;
        let counts = record.phase_counts()?;
        self.reporter.on_labelled(&exp_date, &counts);

        info!(" Experiment {} data loaded", record.config().file_name);
        debug!(
            "Experiment {}: prepared {} samples in {:?}",
            exp_date,
            record.len(),
            started.elapsed()
        );
        Ok(record)
    }

    /// Prepare every experiment, skipping those that fail.
    ///
    /// A [`AnalysisError::Configuration`] error aborts instead of skipping.
    pub fn prepare_all(
        &mut self,
        config_paths: &[PathBuf],
        summary: &mut BatchSummary,
    ) -> Result<Vec<ExperimentRecord>> {
        let mut records = Vec::with_capacity(config_paths.len());
        for path in config_paths {
            match self.prepare_experiment(path) {
                Ok(record) => {
                    summary.processed.push(record.exp_date().to_string());
                    records.push(record);
                }
                Err(e) if e.is_per_experiment() => {
                    let source = path.display().to_string();
                    error!(" ERROR while loading experiment {}: {}", source, e);
                    self.reporter.on_experiment_skipped(&source, &e);
                    summary.skipped.push(SkippedExperiment { source, error: e });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    // ------------------------------------------------------------------------
    // Analyses
    // ------------------------------------------------------------------------

    /// Per-experiment heatmaps for AIR, CO2 and POST_CO2
    pub fn run_heatmaps(&mut self, config_paths: &[PathBuf]) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let records = self.prepare_all(config_paths, &mut summary)?;
        for record in &records {
            for phase in Phase::ALL {
                self.write_experiment_heatmap(record, phase, &mut summary)?;
            }
        }
        Ok(summary)
    }

    /// Grouped heatmap of the configured phase.
    ///
    /// Each experiment is flipped towards `GRP_BY` (when set), gets its own
    /// heatmap of the phase, is offset by its alignment anchor and is pooled
    /// in order. The pooled samples make one grouped heatmap.
    pub fn run_group<A: AnchorProvider>(
        &mut self,
        config_paths: &[PathBuf],
        anchors: &mut A,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let records = self.prepare_all(config_paths, &mut summary)?;
        let phase = self.config.odor;
        let mut aggregator = Aggregator::new(phase);
        let mut colors: Option<(String, String)> = None;

        for record in records {
            let record = match self.config.group_by {
                Some(side) => {
                    let flip = side.needs_flip(record.test_cue_y());
                    let record = record.apply_side_flip(side);
                    if flip {
                        self.reporter.on_side_flip(record.exp_date());
                    }
                    record
                }
                None => record,
            };

            self.write_experiment_heatmap(&record, phase, &mut summary)?;

            // a provider with nothing to say keeps the record's own cuePosToAlign
            let anchor = anchors.anchor_for(&record).or(record.anchor());
            let record = record.with_anchor(anchor);
            let offset = AlignmentOffset::for_record(&record, self.config.lim_x);
            if anchor.is_some() && offset.is_zero() {
                debug!("Experiment {}: anchor gives zero offset", record.exp_date());
            }
            aggregator.add(&record, offset)?;

            if colors.is_none() {
                let c = record.config();
                colors = Some((c.test_color.clone(), c.base_color.clone()));
            }
        }

        let Some((test_color, base_color)) = colors else {
            warn!("No experiment could be grouped, grouped heatmap not generated");
            return Ok(summary);
        };

        let experiments = aggregator.experiments().to_vec();
        let pooled = aggregator.finish();
        self.reporter
            .on_group_complete(experiments.len(), pooled.len());

        let planes = pooled.densities(self.config.bins)?;
        let artifact = HeatmapArtifact::for_group(
            &self.config.group_name,
            phase,
            &test_color,
            &base_color,
            planes,
            self.config.norm,
        );
        let path = self.write_artifact(&artifact, &mut summary)?;
        summary.group = Some(GroupOutcome {
            name: artifact.name,
            phase,
            experiments,
            samples: pooled.len(),
            path,
        });
        Ok(summary)
    }

    /// Per-phase flight activity of every experiment
    pub fn run_activity(&mut self, config_paths: &[PathBuf]) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let records = self.prepare_all(config_paths, &mut summary)?;
        let estimator = ActivityEstimator::new(self.config.min_flight_time);
        for record in &records {
            let estimate = estimator.estimate(record)?;
            self.reporter.on_activity(record.exp_date(), &estimate);
            if !estimate.shows_co2_response() {
                info!(
                    " Experiment {}: no increase of flight activity during CO2",
                    record.exp_date()
                );
            }
            summary
                .activities
                .push((record.exp_date().to_string(), estimate));
        }
        Ok(summary)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn write_experiment_heatmap(
        &mut self,
        record: &ExperimentRecord,
        phase: Phase,
        summary: &mut BatchSummary,
    ) -> Result<()> {
        let (x, y, z) = record.phase_coordinates(phase)?;
        let planes = PlaneDensities::build(&x, &y, &z, self.config.bins)?;
        let artifact = HeatmapArtifact::for_experiment(record.config(), phase, planes, self.config.norm);
        self.write_artifact(&artifact, summary)?;
        Ok(())
    }

    /// Hand an artifact to the sink. Render failures are recorded, not raised.
    fn write_artifact(
        &mut self,
        artifact: &HeatmapArtifact,
        summary: &mut BatchSummary,
    ) -> Result<Option<PathBuf>> {
        match self.sink.write(artifact) {
            Ok(path) => {
                self.reporter
                    .on_heatmap_written(&artifact.name, artifact.phase, &path);
                summary.written.push((artifact.name.clone(), path.clone()));
                Ok(Some(path))
            }
            Err(e @ AnalysisError::Render { .. }) => {
                error!("  -ERROR! while saving heatmap {}: {}", artifact.name, e);
                self.reporter.on_experiment_skipped(&artifact.name, &e);
                summary.skipped.push(SkippedExperiment {
                    source: artifact.name.clone(),
                    error: e,
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
