//! Run configuration
//!
//! One YAML file (conventionally `ExpMetaData.yaml`) holds the settings
//! shared by every experiment in a batch: where data lives, the tunnel
//! dimensions, how to group experiments and how to normalise heatmaps.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alignment::CueSide;
use crate::common::constants::DEFAULT_NORM_CEILING;
use crate::errors::{AnalysisError, Result};
use crate::experiment::{Phase, SpatialBounds};
use crate::heatmap::BinCount;

/// Batch-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding experiment YAML files and recordings
    #[serde(rename = "IN_PATH")]
    pub in_path: PathBuf,
    /// Directory heatmaps are written to
    #[serde(rename = "OUT_PATH")]
    pub out_path: PathBuf,
    /// Dataset inside each recording
    #[serde(rename = "DATASET")]
    pub dataset: String,
    /// Half-length of the tunnel along X
    #[serde(rename = "LIM_X")]
    pub lim_x: f64,
    /// Half-width of the tunnel along Y
    #[serde(rename = "LIM_Y")]
    pub lim_y: f64,
    /// Group experiments by the side of their test cue
    #[serde(
        rename = "GRP_BY",
        default,
        deserialize_with = "deserialize_group_by",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_by: Option<CueSide>,
    /// Phase used for grouping and alignment
    #[serde(rename = "ODOR", default = "default_phase")]
    pub odor: Phase,
    /// Shortest trajectory counted by the activity estimate (seconds)
    #[serde(rename = "MIN_FLIGHT_TIME", default)]
    pub min_flight_time: f64,
    /// Colour-scale ceiling of normalised heatmaps
    #[serde(rename = "NORM", default = "default_norm")]
    pub norm: f64,
    /// Name of the grouped heatmap
    #[serde(rename = "HM_GRP_NAME", default = "default_group_name")]
    pub group_name: String,
    /// Heatmap bins per axis
    #[serde(rename = "NBINS", default)]
    pub bins: BinCount,
}

fn default_phase() -> Phase {
    Phase::Co2
}

fn default_norm() -> f64 {
    DEFAULT_NORM_CEILING
}

fn default_group_name() -> String {
    "hm_grouped".to_string()
}

fn deserialize_group_by<'de, D>(deserializer: D) -> std::result::Result<Option<CueSide>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.parse::<CueSide>().map(Some).map_err(D::Error::custom),
    }
}

impl RunConfig {
    /// Config with the rig's usual defaults for everything but the paths
    pub fn new(in_path: impl Into<PathBuf>, out_path: impl Into<PathBuf>, dataset: impl Into<String>) -> Self {
        Self {
            in_path: in_path.into(),
            out_path: out_path.into(),
            dataset: dataset.into(),
            lim_x: 0.9,
            lim_y: 0.3,
            group_by: None,
            odor: default_phase(),
            min_flight_time: 0.0,
            norm: default_norm(),
            group_name: default_group_name(),
            bins: BinCount::default(),
        }
    }

    /// Load and validate a run configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalysisError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: RunConfig = serde_yaml::from_str(&content).map_err(|e| {
            AnalysisError::configuration(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if !(self.lim_x.is_finite() && self.lim_x > 0.0) {
            return Err(AnalysisError::configuration(format!(
                "LIM_X must be positive, got {}",
                self.lim_x
            )));
        }
        if !(self.lim_y.is_finite() && self.lim_y > 0.0) {
            return Err(AnalysisError::configuration(format!(
                "LIM_Y must be positive, got {}",
                self.lim_y
            )));
        }
        if self.bins.x == 0 || self.bins.y == 0 {
            return Err(AnalysisError::configuration(format!(
                "NBINS must be positive, got [{}, {}]",
                self.bins.x, self.bins.y
            )));
        }
        if !(self.norm.is_finite() && self.norm > 0.0) {
            return Err(AnalysisError::configuration(format!(
                "NORM must be positive, got {}",
                self.norm
            )));
        }
        if !(self.min_flight_time.is_finite() && self.min_flight_time >= 0.0) {
            return Err(AnalysisError::configuration(format!(
                "MIN_FLIGHT_TIME must be non-negative, got {}",
                self.min_flight_time
            )));
        }
        if self.dataset.trim().is_empty() {
            return Err(AnalysisError::configuration("DATASET must not be empty"));
        }
        Ok(())
    }

    /// Tracking volume
    #[inline]
    pub fn spatial_bounds(&self) -> SpatialBounds {
        SpatialBounds::new(self.lim_x, self.lim_y)
    }
}
