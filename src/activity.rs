//! Flight activity per stimulus phase
//!
//! Counts trajectories and sums their durations in each phase. Short
//! trajectories (below a minimum duration) are treated as tracking noise
//! and ignored.
//!
//! A trajectory here is the set of samples sharing an object id *within one
//! phase*: its duration is `max(t) - min(t)` over the samples that have both
//! that id and that phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::experiment::{ExperimentRecord, Phase};

/// Activity in one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseActivity {
    /// Trajectories at least as long as the minimum duration
    pub trajectories: usize,
    /// Summed duration of those trajectories (seconds)
    pub total_duration: f64,
}

/// Activity in all three phases of an experiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityEstimate {
    pub air: PhaseActivity,
    pub co2: PhaseActivity,
    pub post_co2: PhaseActivity,
}

impl ActivityEstimate {
    pub fn get(&self, phase: Phase) -> &PhaseActivity {
        match phase {
            Phase::Air => &self.air,
            Phase::Co2 => &self.co2,
            Phase::PostCo2 => &self.post_co2,
        }
    }

    fn get_mut(&mut self, phase: Phase) -> &mut PhaseActivity {
        match phase {
            Phase::Air => &mut self.air,
            Phase::Co2 => &mut self.co2,
            Phase::PostCo2 => &mut self.post_co2,
        }
    }

    /// CO2 flight time relative to AIR flight time
    pub fn co2_to_air_ratio(&self) -> Option<f64> {
        ratio(self.co2.total_duration, self.air.total_duration)
    }

    /// POST_CO2 flight time relative to CO2 flight time
    pub fn post_to_co2_ratio(&self) -> Option<f64> {
        ratio(self.post_co2.total_duration, self.co2.total_duration)
    }

    /// Whether flight activity went up once the odor was released.
    ///
    /// This is the acceptance condition for including an experiment in
    /// grouped analyses.
    pub fn shows_co2_response(&self) -> bool {
        self.co2.total_duration > self.air.total_duration
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

/// Per-phase trajectory counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityEstimator {
    min_duration: f64,
}

impl ActivityEstimator {
    /// # Arguments
    /// * `min_duration` - Shortest trajectory (seconds) that still counts
    pub fn new(min_duration: f64) -> Self {
        Self { min_duration }
    }

    #[inline]
    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Estimate activity from parallel id / timestamp / phase slices
    pub fn estimate_arrays(
        &self,
        obj_ids: &[i64],
        timestamps: &[f64],
        phases: &[Phase],
    ) -> Result<ActivityEstimate> {
        if obj_ids.len() != timestamps.len() || obj_ids.len() != phases.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: obj_ids.len(),
                actual: if timestamps.len() != obj_ids.len() {
                    timestamps.len()
                } else {
                    phases.len()
                },
                context: "activity inputs".to_string(),
            });
        }

        // (phase, id) -> (first, last) timestamp
        let mut spans: BTreeMap<(Phase, i64), (f64, f64)> = BTreeMap::new();
        for ((&id, &t), &phase) in obj_ids.iter().zip(timestamps).zip(phases) {
            spans
                .entry((phase, id))
                .and_modify(|(lo, hi)| {
                    *lo = lo.min(t);
                    *hi = hi.max(t);
                })
                .or_insert((t, t));
        }

        let mut estimate = ActivityEstimate::default();
        for ((phase, _id), (lo, hi)) in spans {
            let duration = hi - lo;
            if duration >= self.min_duration {
                let slot = estimate.get_mut(phase);
                slot.trajectories += 1;
                slot.total_duration += duration;
            }
        }
        Ok(estimate)
    }

    /// Estimate activity of a phase-labelled record
    pub fn estimate(&self, record: &ExperimentRecord) -> Result<ActivityEstimate> {
        let phases = record.phases().ok_or_else(|| AnalysisError::Unlabelled {
            experiment: record.exp_date().to_string(),
        })?;
        let samples = record.samples();
        self.estimate_arrays(samples.obj_ids(), samples.timestamps(), phases)
    }
}
