//! Core sample types
//!
//! - [`Phase`] - stimulus phase a sample was recorded in
//! - [`TrajectorySample`] - one row across the parallel arrays
//! - [`SampleArrays`] - the six lockstep arrays produced by the tracker

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

// ============================================================================
// Phase
// ============================================================================

/// Stimulus phase of an experiment.
///
/// Numeric codes match the labels stored alongside exported trajectories:
/// AIR=1, CO2=2, POST_CO2=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Phase {
    /// Clean air before odor onset
    Air = 1,
    /// Odor (CO2) release
    Co2 = 2,
    /// Clean air after the odor is switched off
    PostCo2 = 3,
}

impl Phase {
    /// All phases in experiment order
    pub const ALL: [Phase; 3] = [Phase::Air, Phase::Co2, Phase::PostCo2];

    /// Numeric label code
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a phase from its numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Phase::Air),
            2 => Some(Phase::Co2),
            3 => Some(Phase::PostCo2),
            _ => None,
        }
    }

    /// Name used in heatmap titles and artifact names
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::Air => "AIR",
            Phase::Co2 => "CO2",
            Phase::PostCo2 => "PostCO2",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Phase::from_code(code).ok_or_else(|| format!("invalid phase code {} (expected 1, 2 or 3)", code))
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase.code()
    }
}

// ============================================================================
// TrajectorySample
// ============================================================================

/// One position observation, viewed as a row across [`SampleArrays`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    /// Tracker-assigned object identifier (recurs over time)
    pub obj_id: i64,
    /// Camera frame index
    pub frame: i64,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Z position
    pub z: f64,
    /// Phase label, if the record has been labelled
    pub phase: Option<Phase>,
}

// ============================================================================
// SampleArrays
// ============================================================================

/// Six equal-length parallel arrays: object id, frame, timestamp, x, y, z.
///
/// Fields are private so the equal-length invariant can only be broken by
/// code in this module. Every narrowing goes through [`SampleArrays::select`],
/// which applies one mask to all six arrays in lockstep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleArrays {
    obj_ids: Vec<i64>,
    frames: Vec<i64>,
    timestamps: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl SampleArrays {
    /// Build from parallel arrays, rejecting arrays of unequal length
    pub fn new(
        obj_ids: Vec<i64>,
        frames: Vec<i64>,
        timestamps: Vec<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    ) -> Result<Self> {
        let expected = obj_ids.len();
        for (name, len) in [
            ("frame", frames.len()),
            ("timestamp", timestamps.len()),
            ("x", x.len()),
            ("y", y.len()),
            ("z", z.len()),
        ] {
            if len != expected {
                return Err(AnalysisError::DimensionMismatch {
                    expected,
                    actual: len,
                    context: format!("{} array", name),
                });
            }
        }

        Ok(Self {
            obj_ids,
            frames,
            timestamps,
            x,
            y,
            z,
        })
    }

    /// Empty sample set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.obj_ids.len()
    }

    /// Whether there are no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obj_ids.is_empty()
    }

    #[inline]
    pub fn obj_ids(&self) -> &[i64] {
        &self.obj_ids
    }

    #[inline]
    pub fn frames(&self) -> &[i64] {
        &self.frames
    }

    #[inline]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    #[inline]
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Row view of sample `index` (without a phase label)
    pub fn get(&self, index: usize) -> Option<TrajectorySample> {
        if index >= self.len() {
            return None;
        }
        Some(TrajectorySample {
            obj_id: self.obj_ids[index],
            frame: self.frames[index],
            timestamp: self.timestamps[index],
            x: self.x[index],
            y: self.y[index],
            z: self.z[index],
            phase: None,
        })
    }

    /// Keep the samples whose mask entry is `true`, in their original order.
    ///
    /// The mask must have one entry per sample.
    pub fn select(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: self.len(),
                actual: mask.len(),
                context: "sample mask".to_string(),
            });
        }

        let kept = mask.iter().filter(|&&keep| keep).count();
        let mut out = Self {
            obj_ids: Vec::with_capacity(kept),
            frames: Vec::with_capacity(kept),
            timestamps: Vec::with_capacity(kept),
            x: Vec::with_capacity(kept),
            y: Vec::with_capacity(kept),
            z: Vec::with_capacity(kept),
        };

        for (i, _) in mask.iter().enumerate().filter(|&(_, &keep)| keep) {
            out.obj_ids.push(self.obj_ids[i]);
            out.frames.push(self.frames[i]);
            out.timestamps.push(self.timestamps[i]);
            out.x.push(self.x[i]);
            out.y.push(self.y[i]);
            out.z.push(self.z[i]);
        }

        Ok(out)
    }

    /// Same samples with every Y value negated
    pub fn with_y_negated(mut self) -> Self {
        for y in self.y.iter_mut() {
            *y = -*y;
        }
        self
    }
}
