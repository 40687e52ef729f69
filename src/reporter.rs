//! Observability for batch execution.
//!
//! The [`PipelineReporter`] trait receives callbacks at each stage of an
//! experiment's processing without cluttering the pipeline itself.
//!
//! - [`NoOpReporter`] ignores everything
//! - [`LoggingReporter`] forwards events to the `log` facade
//! - [`DebugReporter`] stores events for inspection (mostly in tests)
//! - [`CompositeReporter`] fans out to two reporters
//!
//! # Example
//!
//! ```
//! use flydra_odor_analysis::reporter::{DebugReporter, PipelineReporter};
//!
//! let mut reporter = DebugReporter::new();
//! reporter.on_samples_loaded("20190320", 1200);
//! assert_eq!(reporter.events().len(), 1);
//! ```

use std::path::{Path, PathBuf};

use crate::activity::ActivityEstimate;
use crate::errors::AnalysisError;
use crate::experiment::{Phase, PhaseCounts};

// ============================================================================
// PipelineReporter Trait
// ============================================================================

/// Filtering stage reported by [`PipelineReporter::on_filtered`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Experiment start/end time window
    TimeWindow,
    /// Wind-tunnel tracking volume
    TrackingVolume,
}

/// Callbacks fired while a batch runs.
///
/// All methods have empty default implementations; override the ones you
/// need. Callbacks take `&mut self`, so reporters need not be `Send`.
pub trait PipelineReporter {
    /// Experiment configuration parsed
    fn on_config_loaded(&mut self, _exp_date: &str, _path: &Path) {}

    /// Raw samples read from the recording
    fn on_samples_loaded(&mut self, _exp_date: &str, _count: usize) {}

    /// A filter narrowed the samples from `before` to `after`
    fn on_filtered(&mut self, _exp_date: &str, _stage: FilterStage, _before: usize, _after: usize) {}

    /// Phase labels assigned
    fn on_labelled(&mut self, _exp_date: &str, _counts: &PhaseCounts) {}

    /// Y axis negated for side grouping
    fn on_side_flip(&mut self, _exp_date: &str) {}

    /// Heatmap artifact written
    fn on_heatmap_written(&mut self, _name: &str, _phase: Phase, _path: &Path) {}

    /// Activity estimated
    fn on_activity(&mut self, _exp_date: &str, _estimate: &ActivityEstimate) {}

    /// Experiment (or one of its steps) skipped after an error
    fn on_experiment_skipped(&mut self, _source: &str, _error: &AnalysisError) {}

    /// Grouped samples pooled from `experiments` experiments
    fn on_group_complete(&mut self, _experiments: usize, _samples: usize) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Event captured by [`DebugReporter`]
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    ConfigLoaded {
        exp_date: String,
        path: PathBuf,
    },
    SamplesLoaded {
        exp_date: String,
        count: usize,
    },
    Filtered {
        exp_date: String,
        stage: FilterStage,
        before: usize,
        after: usize,
    },
    Labelled {
        exp_date: String,
        counts: PhaseCounts,
    },
    SideFlip {
        exp_date: String,
    },
    HeatmapWritten {
        name: String,
        phase: Phase,
        path: PathBuf,
    },
    Activity {
        exp_date: String,
        estimate: ActivityEstimate,
    },
    Skipped {
        source: String,
        error: String,
    },
    GroupComplete {
        experiments: usize,
        samples: usize,
    },
}

/// Reporter that records every event in order.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    events: Vec<PipelineEvent>,
}

impl DebugReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all captured events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// All captured events, oldest first
    pub fn events(&self) -> &[PipelineEvent] {
        &self.events
    }

    /// Names of heatmaps written
    pub fn heatmaps(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::HeatmapWritten { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Sources of skipped experiments
    pub fn skipped(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Skipped { source, .. } => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of side flips observed for an experiment
    pub fn side_flips(&self, exp_date: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::SideFlip { exp_date: d } if d == exp_date))
            .count()
    }
}

impl PipelineReporter for DebugReporter {
    fn on_config_loaded(&mut self, exp_date: &str, path: &Path) {
        self.events.push(PipelineEvent::ConfigLoaded {
            exp_date: exp_date.to_string(),
            path: path.to_path_buf(),
        });
    }

    fn on_samples_loaded(&mut self, exp_date: &str, count: usize) {
        self.events.push(PipelineEvent::SamplesLoaded {
            exp_date: exp_date.to_string(),
            count,
        });
    }

    fn on_filtered(&mut self, exp_date: &str, stage: FilterStage, before: usize, after: usize) {
        self.events.push(PipelineEvent::Filtered {
            exp_date: exp_date.to_string(),
            stage,
            before,
            after,
        });
    }

    fn on_labelled(&mut self, exp_date: &str, counts: &PhaseCounts) {
        self.events.push(PipelineEvent::Labelled {
            exp_date: exp_date.to_string(),
            counts: *counts,
        });
    }

    fn on_side_flip(&mut self, exp_date: &str) {
        self.events.push(PipelineEvent::SideFlip {
            exp_date: exp_date.to_string(),
        });
    }

    fn on_heatmap_written(&mut self, name: &str, phase: Phase, path: &Path) {
        self.events.push(PipelineEvent::HeatmapWritten {
            name: name.to_string(),
            phase,
            path: path.to_path_buf(),
        });
    }

    fn on_activity(&mut self, exp_date: &str, estimate: &ActivityEstimate) {
        self.events.push(PipelineEvent::Activity {
            exp_date: exp_date.to_string(),
            estimate: *estimate,
        });
    }

    fn on_experiment_skipped(&mut self, source: &str, error: &AnalysisError) {
        self.events.push(PipelineEvent::Skipped {
            source: source.to_string(),
            error: error.to_string(),
        });
    }

    fn on_group_complete(&mut self, experiments: usize, samples: usize) {
        self.events.push(PipelineEvent::GroupComplete {
            experiments,
            samples,
        });
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that logs events through the `log` crate.
///
/// - config loaded, heatmap written, activity: INFO
/// - samples loaded, filter stages, labelling, flips, skips: DEBUG
///
/// Skipped experiments are already logged as errors by the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineReporter for LoggingReporter {
    fn on_config_loaded(&mut self, exp_date: &str, _path: &Path) {
        log::info!(" Configuration settings for experiment on {} loaded", exp_date);
    }

    fn on_samples_loaded(&mut self, exp_date: &str, count: usize) {
        log::debug!(" Experiment {}: {} raw samples", exp_date, count);
    }

    fn on_filtered(&mut self, exp_date: &str, stage: FilterStage, before: usize, after: usize) {
        log::debug!(
            " Experiment {}: {:?} kept {}/{} samples",
            exp_date,
            stage,
            after,
            before
        );
    }

    fn on_labelled(&mut self, exp_date: &str, counts: &PhaseCounts) {
        log::debug!(
            " Experiment {}: AIR={} CO2={} PostCO2={}",
            exp_date,
            counts.air,
            counts.co2,
            counts.post_co2
        );
    }

    fn on_side_flip(&mut self, exp_date: &str) {
        log::debug!(" Experiment {}: Y axis flipped", exp_date);
    }

    fn on_heatmap_written(&mut self, name: &str, phase: Phase, path: &Path) {
        log::info!("  -Heatmap {} ({}) written to {}", name, phase, path.display());
    }

    fn on_activity(&mut self, exp_date: &str, estimate: &ActivityEstimate) {
        log::info!(
            " Activity {}: trajectories AIR={} CO2={} PostCO2={}, duration AIR={:.2}s CO2={:.2}s PostCO2={:.2}s",
            exp_date,
            estimate.air.trajectories,
            estimate.co2.trajectories,
            estimate.post_co2.trajectories,
            estimate.air.total_duration,
            estimate.co2.total_duration,
            estimate.post_co2.total_duration
        );
    }

    fn on_experiment_skipped(&mut self, source: &str, error: &AnalysisError) {
        log::debug!(" Skipped {}: {}", source, error);
    }

    fn on_group_complete(&mut self, experiments: usize, samples: usize) {
        log::info!(" Grouped {} samples from {} experiments", samples, experiments);
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: PipelineReporter, B: PipelineReporter> {
    first: A,
    second: B,
}

impl<A: PipelineReporter, B: PipelineReporter> CompositeReporter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: PipelineReporter, B: PipelineReporter> PipelineReporter for CompositeReporter<A, B> {
    fn on_config_loaded(&mut self, exp_date: &str, path: &Path) {
        self.first.on_config_loaded(exp_date, path);
        self.second.on_config_loaded(exp_date, path);
    }

    fn on_samples_loaded(&mut self, exp_date: &str, count: usize) {
        self.first.on_samples_loaded(exp_date, count);
        self.second.on_samples_loaded(exp_date, count);
    }

    fn on_filtered(&mut self, exp_date: &str, stage: FilterStage, before: usize, after: usize) {
        self.first.on_filtered(exp_date, stage, before, after);
        self.second.on_filtered(exp_date, stage, before, after);
    }

    fn on_labelled(&mut self, exp_date: &str, counts: &PhaseCounts) {
        self.first.on_labelled(exp_date, counts);
        self.second.on_labelled(exp_date, counts);
    }

    fn on_side_flip(&mut self, exp_date: &str) {
        self.first.on_side_flip(exp_date);
        self.second.on_side_flip(exp_date);
    }

    fn on_heatmap_written(&mut self, name: &str, phase: Phase, path: &Path) {
        self.first.on_heatmap_written(name, phase, path);
        self.second.on_heatmap_written(name, phase, path);
    }

    fn on_activity(&mut self, exp_date: &str, estimate: &ActivityEstimate) {
        self.first.on_activity(exp_date, estimate);
        self.second.on_activity(exp_date, estimate);
    }

    fn on_experiment_skipped(&mut self, source: &str, error: &AnalysisError) {
        self.first.on_experiment_skipped(source, error);
        self.second.on_experiment_skipped(source, error);
    }

    fn on_group_complete(&mut self, experiments: usize, samples: usize) {
        self.first.on_group_complete(experiments, samples);
        self.second.on_group_complete(experiments, samples);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reporter() {
        let mut reporter = NoOpReporter::new();
        reporter.on_samples_loaded("x", 3);
        reporter.on_group_complete(1, 3);
    }

    #[test]
    fn test_debug_reporter_captures_events_in_order() {
        let mut reporter = DebugReporter::new();
        reporter.on_samples_loaded("a", 10);
        reporter.on_filtered("a", FilterStage::TimeWindow, 10, 8);
        reporter.on_side_flip("a");
        reporter.on_heatmap_written("hm_a", Phase::Co2, Path::new("/tmp/hm_a.json"));
        reporter.on_experiment_skipped(
            "b.yaml",
            &AnalysisError::Unlabelled {
                experiment: "b".into(),
            },
        );

        assert_eq!(reporter.events().len(), 5);
        assert_eq!(
            reporter.events()[1],
            PipelineEvent::Filtered {
                exp_date: "a".into(),
                stage: FilterStage::TimeWindow,
                before: 10,
                after: 8
            }
        );
        assert_eq!(reporter.heatmaps(), vec!["hm_a"]);
        assert_eq!(reporter.skipped(), vec!["b.yaml"]);
        assert_eq!(reporter.side_flips("a"), 1);
        assert_eq!(reporter.side_flips("b"), 0);

        reporter.clear();
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn test_logging_reporter() {
        let mut reporter = LoggingReporter::new();
        reporter.on_config_loaded("a", Path::new("a.yaml"));
        reporter.on_activity("a", &ActivityEstimate::default());
    }

    #[test]
    fn test_composite_reporter() {
        let mut composite = CompositeReporter::new(DebugReporter::new(), LoggingReporter::new());
        composite.on_samples_loaded("a", 1);
        composite.on_group_complete(2, 7);
        assert_eq!(composite.first().events().len(), 2);

        let (debug, _logging) = composite.into_parts();
        assert_eq!(
            debug.events()[1],
            PipelineEvent::GroupComplete {
                experiments: 2,
                samples: 7
            }
        );
    }
}
