//! Pooling samples across experiments
//!
//! The [`Aggregator`] collects one phase's samples from a sequence of
//! experiments (already side-flipped and offset-aligned) so they can be
//! binned into a single grouped heatmap.

use log::debug;

use crate::alignment::AlignmentOffset;
use crate::errors::Result;
use crate::experiment::{ExperimentRecord, Phase};
use crate::heatmap::{BinCount, PlaneDensities};

/// Concatenated coordinates of several experiments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub phases: Vec<Phase>,
}

impl GroupedSamples {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Bin the pooled samples into X-Y / X-Z grids
    pub fn densities(&self, bins: BinCount) -> Result<PlaneDensities> {
        PlaneDensities::build(&self.x, &self.y, &self.z, bins)
    }
}

/// Accumulates one phase's samples, experiment by experiment, in order
#[derive(Debug, Clone)]
pub struct Aggregator {
    phase: Phase,
    pooled: GroupedSamples,
    experiments: Vec<(String, usize)>,
}

impl Aggregator {
    /// # Arguments
    /// * `phase` - The only phase that is pooled
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            pooled: GroupedSamples::default(),
            experiments: Vec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Append a record's samples of the selected phase, translated by `offset`.
    ///
    /// Returns the number of samples added. Fails on an unlabelled record.
    pub fn add(&mut self, record: &ExperimentRecord, offset: AlignmentOffset) -> Result<usize> {
        let (mut x, mut y, z) = record.phase_coordinates(self.phase)?;
        offset.apply(&mut x, &mut y);

        let added = x.len();
        self.pooled.x.extend(x);
        self.pooled.y.extend(y);
        self.pooled.z.extend(z);
        self.pooled
            .phases
            .extend(std::iter::repeat(self.phase).take(added));
        self.experiments.push((record.exp_date().to_string(), added));

        debug!(
            "Group: added {} {} samples from {} (offset dx={:.4} dy={:.4})",
            added,
            self.phase,
            record.exp_date(),
            offset.dx,
            offset.dy
        );
        Ok(added)
    }

    /// Experiments added so far with their sample counts, in order
    pub fn experiments(&self) -> &[(String, usize)] {
        &self.experiments
    }

    /// Samples pooled so far
    pub fn len(&self) -> usize {
        self.pooled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pooled.is_empty()
    }

    pub fn samples(&self) -> &GroupedSamples {
        &self.pooled
    }

    /// Hand over the pooled samples
    pub fn finish(self) -> GroupedSamples {
        self.pooled
    }
}
