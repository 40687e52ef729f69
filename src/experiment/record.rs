//! Experiment metadata and its sample set
//!
//! An [`ExperimentRecord`] starts life from an [`ExperimentConfig`] with no
//! samples, is populated by a [`SampleReader`](crate::io::SampleReader) and
//! is then narrowed by a fixed sequence of stages:
//!
//! ```text
//! from_config -> with_samples -> apply_start_end_ts -> erase_pos_outside_wt -> set_odor_stim
//! ```
//!
//! Every stage consumes the record and returns a new one, so a record is
//! never observed half-filtered.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::filters::{label_phases, time_window_mask, PhaseBoundaries, PhaseCounts, PhaseLabelling, SpatialBounds};
use super::types::{Phase, SampleArrays, TrajectorySample};
use crate::alignment::CueSide;
use crate::errors::{AnalysisError, Result};

// ============================================================================
// Configuration record
// ============================================================================

/// Per-experiment configuration as written by the rig operators.
///
/// Field names follow the YAML files stored next to each recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(rename = "expDate", deserialize_with = "deserialize_token")]
    pub exp_date: String,
    /// Recording file name; also the data-source identifier
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "type", default, deserialize_with = "deserialize_token")]
    pub exp_type: String,
    #[serde(default, deserialize_with = "deserialize_token")]
    pub gender: String,
    /// Colour of the baseline cue
    #[serde(rename = "clrBASE")]
    pub base_color: String,
    /// Colour of the test cue
    #[serde(rename = "clrTEST")]
    pub test_color: String,
    /// Odor source position (carried through, unused by the analysis)
    #[serde(
        rename = "posOdor",
        default,
        deserialize_with = "deserialize_optional_position"
    )]
    pub odor_position: Option<[f64; 3]>,
    #[serde(rename = "posClrBASE", deserialize_with = "deserialize_position")]
    pub base_cue_position: [f64; 3],
    #[serde(rename = "posClrTEST", deserialize_with = "deserialize_position")]
    pub test_cue_position: [f64; 3],
    #[serde(rename = "ts_1_StartExp")]
    pub ts_start: f64,
    #[serde(rename = "ts_2_CO2")]
    pub ts_co2: f64,
    #[serde(rename = "ts_3_PostCO2")]
    pub ts_post_co2: f64,
    #[serde(rename = "ts_4_EndExp")]
    pub ts_end: f64,
    /// Alignment anchor picked on a previously rendered heatmap
    #[serde(
        rename = "cuePosToAlign",
        default,
        deserialize_with = "deserialize_anchor",
        skip_serializing_if = "Option::is_none"
    )]
    pub cue_pos_to_align: Option<[f64; 2]>,
}

impl ExperimentConfig {
    /// Phase boundaries of this experiment
    pub fn boundaries(&self) -> PhaseBoundaries {
        PhaseBoundaries::new(self.ts_start, self.ts_co2, self.ts_post_co2, self.ts_end)
    }
}

/// Load one experiment configuration file.
///
/// Any read or parse failure becomes [`AnalysisError::ConfigLoad`] so the
/// batch can skip this experiment.
pub fn load_experiment_config(path: &Path) -> Result<ExperimentConfig> {
    let content = fs::read_to_string(path).map_err(|e| AnalysisError::ConfigLoad {
        path: path.to_path_buf(),
        description: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| AnalysisError::ConfigLoad {
        path: path.to_path_buf(),
        description: e.to_string(),
    })
}

// ----------------------------------------------------------------------------
// Deserialization helpers
// ----------------------------------------------------------------------------

/// Cue coordinates are written either as numbers or as quoted strings
/// (`'-0.15'`). Accept both.
fn deserialize_position<'de, D>(deserializer: D) -> std::result::Result<[f64; 3], D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Vec<Coordinate> = Vec::deserialize(deserializer)?;
    if raw.len() != 3 {
        return Err(D::Error::invalid_length(raw.len(), &"three coordinates"));
    }
    Ok([raw[0].0, raw[1].0, raw[2].0])
}

fn deserialize_optional_position<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<[f64; 3]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Option<Vec<Coordinate>> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.len() == 3 => Ok(Some([v[0].0, v[1].0, v[2].0])),
        Some(v) => Err(D::Error::invalid_length(v.len(), &"three coordinates")),
    }
}

/// An anchor with a missing component (`[null, null]`) means no anchor.
fn deserialize_anchor<'de, D>(deserializer: D) -> std::result::Result<Option<[f64; 2]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some([]) => Ok(None),
        Some(&[Some(x), Some(y)]) => Ok(Some([x, y])),
        Some(&[_, _]) => Ok(None),
        Some(v) => Err(D::Error::invalid_length(v.len(), &"two coordinates")),
    }
}

/// Dates and metadata are sometimes unquoted numbers in the YAML files
fn deserialize_token<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Token::deserialize(deserializer)? {
        Token::Text(s) => s,
        Token::Int(i) => i.to_string(),
        Token::Float(f) => f.to_string(),
    })
}

/// A single coordinate that may be a number or a numeric string
struct Coordinate(f64);

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct CoordinateVisitor;

        impl<'de> de::Visitor<'de> for CoordinateVisitor {
            type Value = Coordinate;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a number or a numeric string")
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Coordinate, E>
            where
                E: de::Error,
            {
                Ok(Coordinate(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Coordinate, E>
            where
                E: de::Error,
            {
                Ok(Coordinate(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Coordinate, E>
            where
                E: de::Error,
            {
                Ok(Coordinate(value as f64))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Coordinate, E>
            where
                E: de::Error,
            {
                value
                    .trim()
                    .parse::<f64>()
                    .map(Coordinate)
                    .map_err(|_| E::custom(format!("invalid coordinate '{}'", value)))
            }
        }

        deserializer.deserialize_any(CoordinateVisitor)
    }
}

// ============================================================================
// ExperimentRecord
// ============================================================================

/// One experiment: metadata, samples and (once labelled) phase labels.
#[derive(Debug, Clone)]
pub struct ExperimentRecord {
    config: ExperimentConfig,
    samples: SampleArrays,
    phases: Option<Vec<Phase>>,
    anchor: Option<(f64, f64)>,
    y_flipped: bool,
}

impl ExperimentRecord {
    /// Record built from configuration only, with no samples
    pub fn from_config(config: ExperimentConfig) -> Self {
        let anchor = config.cue_pos_to_align.map(|[x, y]| (x, y));
        if !config.boundaries().is_ordered() {
            warn!(
                "Experiment {}: phase boundaries are not ordered ({:?})",
                config.exp_date,
                config.boundaries()
            );
        }
        Self {
            config,
            samples: SampleArrays::empty(),
            phases: None,
            anchor,
            y_flipped: false,
        }
    }

    /// Replace the sample set (drops any phase labels)
    #[must_use]
    pub fn with_samples(self, samples: SampleArrays) -> Self {
        Self {
            samples,
            phases: None,
            ..self
        }
    }

    /// Attach an externally supplied alignment anchor
    #[must_use]
    pub fn with_anchor(self, anchor: Option<(f64, f64)>) -> Self {
        Self { anchor, ..self }
    }

    // ------------------------------------------------------------------------
    // Pipeline stages
    // ------------------------------------------------------------------------

    /// Drop samples recorded before the experiment start or after its end
    pub fn apply_start_end_ts(self) -> Result<Self> {
        let bounds = self.config.boundaries();
        let mask = time_window_mask(self.samples.timestamps(), &bounds);
        let before = self.samples.len();
        let samples = self.samples.select(&mask)?;
        debug!(
            "Experiment {}: time window kept {}/{} samples",
            self.config.exp_date,
            samples.len(),
            before
        );
        Ok(Self {
            samples,
            phases: None,
            ..self
        })
    }

    /// Drop samples outside the wind-tunnel test section
    pub fn erase_pos_outside_wt(self, bounds: &SpatialBounds) -> Result<Self> {
        let mask = bounds.mask(self.samples.x(), self.samples.y(), self.samples.z());
        let before = self.samples.len();
        let samples = self.samples.select(&mask)?;
        debug!(
            "Experiment {}: tracking volume kept {}/{} samples",
            self.config.exp_date,
            samples.len(),
            before
        );
        Ok(Self {
            samples,
            phases: None,
            ..self
        })
    }

    /// Label every remaining sample with its stimulus phase.
    ///
    /// Returns [`AnalysisError::Integrity`] if the interval counts do not
    /// add up to the sample count; the record is not labelled in that case.
    pub fn set_odor_stim(self) -> Result<Self> {
        match label_phases(self.samples.timestamps(), &self.config.boundaries()) {
            PhaseLabelling::Complete { labels, counts } => {
                debug!(
                    "Experiment {}: labelled AIR={} CO2={} PostCO2={}",
                    self.config.exp_date, counts.air, counts.co2, counts.post_co2
                );
                Ok(Self {
                    phases: Some(labels),
                    ..self
                })
            }
            PhaseLabelling::Inconsistent { counts, total } => Err(AnalysisError::Integrity {
                experiment: self.config.exp_date.clone(),
                labelled: counts.total(),
                total,
            }),
        }
    }

    /// Negate Y if the test cue sits on the other side of the group's target.
    ///
    /// The flip is applied at most once per record; asking again leaves the
    /// record untouched.
    pub fn apply_side_flip(self, target: CueSide) -> Self {
        if self.y_flipped {
            warn!(
                "Experiment {}: Y axis already flipped, not flipping again",
                self.config.exp_date
            );
            return self;
        }
        if CueSide::of(self.test_cue_y()) == target {
            return self;
        }
        debug!(
            "Experiment {}: test cue on {:?} side, flipping Y towards {:?}",
            self.config.exp_date,
            CueSide::of(self.test_cue_y()),
            target
        );
        Self {
            samples: self.samples.with_y_negated(),
            y_flipped: true,
            ..self
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Experiment identifier (its date token)
    #[inline]
    pub fn exp_date(&self) -> &str {
        &self.config.exp_date
    }

    #[inline]
    pub fn samples(&self) -> &SampleArrays {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Phase labels, one per sample, once [`set_odor_stim`](Self::set_odor_stim) succeeded
    #[inline]
    pub fn phases(&self) -> Option<&[Phase]> {
        self.phases.as_deref()
    }

    #[inline]
    pub fn boundaries(&self) -> PhaseBoundaries {
        self.config.boundaries()
    }

    #[inline]
    pub fn anchor(&self) -> Option<(f64, f64)> {
        self.anchor
    }

    #[inline]
    pub fn is_y_flipped(&self) -> bool {
        self.y_flipped
    }

    /// Test-cue (x, y)
    #[inline]
    pub fn test_cue_xy(&self) -> (f64, f64) {
        let [x, y, _] = self.config.test_cue_position;
        (x, y)
    }

    #[inline]
    pub fn test_cue_y(&self) -> f64 {
        self.config.test_cue_position[1]
    }

    /// Row view including the phase label
    pub fn sample(&self, index: usize) -> Option<TrajectorySample> {
        let mut row = self.samples.get(index)?;
        row.phase = self.phases.as_ref().map(|p| p[index]);
        Some(row)
    }

    /// Indices of the samples labelled `phase`
    pub fn phase_indices(&self, phase: Phase) -> Result<Vec<usize>> {
        let labels = self.labels()?;
        Ok(labels
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == phase)
            .map(|(i, _)| i)
            .collect())
    }

    /// Per-phase sample counts
    pub fn phase_counts(&self) -> Result<PhaseCounts> {
        let mut counts = PhaseCounts::default();
        for phase in self.labels()? {
            match phase {
                Phase::Air => counts.air += 1,
                Phase::Co2 => counts.co2 += 1,
                Phase::PostCo2 => counts.post_co2 += 1,
            }
        }
        Ok(counts)
    }

    /// (x, y, z) coordinates of the samples labelled `phase`
    pub fn phase_coordinates(&self, phase: Phase) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let indices = self.phase_indices(phase)?;
        let s = &self.samples;
        Ok((
            indices.iter().map(|&i| s.x()[i]).collect(),
            indices.iter().map(|&i| s.y()[i]).collect(),
            indices.iter().map(|&i| s.z()[i]).collect(),
        ))
    }

    fn labels(&self) -> Result<&[Phase]> {
        self.phases
            .as_deref()
            .ok_or_else(|| AnalysisError::Unlabelled {
                experiment: self.config.exp_date.clone(),
            })
    }
}
