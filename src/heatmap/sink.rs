//! Heatmap artifacts and the sinks that store them
//!
//! Rendering is not done here. A [`HeatmapArtifact`] bundles the two
//! normalised planes with everything a renderer needs (titles, labels,
//! colour scale, axis limits); a [`HeatmapSink`] persists it.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::density::{DensityGrid, PlaneDensities};
use crate::common::constants::XZ_DISPLAY_Z_LIMIT;
use crate::errors::{AnalysisError, Result};
use crate::experiment::{ExperimentConfig, Phase};

// ============================================================================
// Artifact
// ============================================================================

/// Colour map requested from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMap {
    /// Renderer default; used for per-experiment heatmaps
    #[default]
    Viridis,
    /// Used for grouped heatmaps
    Jet,
}

/// One plane of a heatmap with its display labels
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneHeatmap {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed vertical display limits, if any
    pub y_limit: Option<(f64, f64)>,
    pub grid: DensityGrid,
}

/// Everything needed to draw the X-Y / X-Z heatmap pair of one selection
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapArtifact {
    /// File stem of the artifact
    pub name: String,
    pub phase: Phase,
    /// Colour-scale floor
    pub vmin: f64,
    /// Colour-scale ceiling
    pub vmax: f64,
    pub color_map: ColorMap,
    pub xy: PlaneHeatmap,
    pub xz: PlaneHeatmap,
}

impl HeatmapArtifact {
    /// Artifact for a grid pair.
    ///
    /// # Arguments
    /// * `name` - Artifact file stem
    /// * `phase` - Phase the samples were selected from
    /// * `test_color` / `base_color` - Cue colours shown in the titles
    /// * `planes` - Normalised grids
    /// * `vmax` - Colour-scale ceiling
    /// * `color_map` - Colour map for the renderer
    pub fn new(
        name: impl Into<String>,
        phase: Phase,
        test_color: &str,
        base_color: &str,
        planes: PlaneDensities,
        vmax: f64,
        color_map: ColorMap,
    ) -> Self {
        let PlaneDensities { xy, xz } = planes;
        Self {
            name: name.into(),
            phase,
            vmin: 0.0,
            vmax,
            color_map,
            xy: PlaneHeatmap {
                title: plane_title(test_color, base_color, "x-y", phase),
                x_label: "X axis".to_string(),
                y_label: "Y axis".to_string(),
                y_limit: None,
                grid: xy,
            },
            xz: PlaneHeatmap {
                title: plane_title(test_color, base_color, "x-z", phase),
                x_label: "X axis".to_string(),
                y_label: "Z axis".to_string(),
                y_limit: Some((0.0, XZ_DISPLAY_Z_LIMIT)),
                grid: xz,
            },
        }
    }

    /// Per-experiment artifact, named `hm_<date>_<base>_vs_<test>_<code>_<PHASE>`
    pub fn for_experiment(
        config: &ExperimentConfig,
        phase: Phase,
        planes: PlaneDensities,
        vmax: f64,
    ) -> Self {
        Self::new(
            experiment_artifact_name(config, phase),
            phase,
            &config.test_color,
            &config.base_color,
            planes,
            vmax,
            ColorMap::Viridis,
        )
    }

    /// Grouped artifact, named `<group>_<PHASE>_<vmax>`
    pub fn for_group(
        group_name: &str,
        phase: Phase,
        test_color: &str,
        base_color: &str,
        planes: PlaneDensities,
        vmax: f64,
    ) -> Self {
        Self::new(
            group_artifact_name(group_name, phase, vmax),
            phase,
            test_color,
            base_color,
            planes,
            vmax,
            ColorMap::Jet,
        )
    }
}

fn plane_title(test_color: &str, base_color: &str, plane: &str, phase: Phase) -> String {
    format!(
        "heatmap {} vs {} {} axis with stim= {}",
        test_color, base_color, plane, phase
    )
}

/// `hm_<date>_<base>_vs_<test>_<code>_<PHASE>`
pub fn experiment_artifact_name(config: &ExperimentConfig, phase: Phase) -> String {
    format!(
        "hm_{}_{}_vs_{}_{}_{}",
        config.exp_date,
        config.base_color,
        config.test_color,
        phase.code(),
        phase
    )
}

/// `<group>_<PHASE>_<vmax>`
pub fn group_artifact_name(group_name: &str, phase: Phase, vmax: f64) -> String {
    format!("{}_{}_{}", group_name, phase, vmax)
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for heatmap artifacts.
///
/// Failures are reported as [`AnalysisError::Render`]; the batch logs them
/// and carries on.
pub trait HeatmapSink {
    /// Persist an artifact, returning where it went
    fn write(&mut self, artifact: &HeatmapArtifact) -> Result<PathBuf>;
}

/// Keeps artifacts in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub artifacts: Vec<HeatmapArtifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact by name
    pub fn get(&self, name: &str) -> Option<&HeatmapArtifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

impl HeatmapSink for MemorySink {
    fn write(&mut self, artifact: &HeatmapArtifact) -> Result<PathBuf> {
        self.artifacts.push(artifact.clone());
        Ok(PathBuf::from(&artifact.name))
    }
}

/// Writes `<out_dir>/<name>.json` holding the display-oriented grids and
/// their metadata.
#[derive(Debug, Clone)]
pub struct JsonHeatmapSink {
    out_dir: PathBuf,
    pretty: bool,
}

impl JsonHeatmapSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pretty: false,
        }
    }

    /// Pretty-print the JSON documents
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl HeatmapSink for JsonHeatmapSink {
    fn write(&mut self, artifact: &HeatmapArtifact) -> Result<PathBuf> {
        let render_err = |description: String| AnalysisError::Render {
            name: artifact.name.clone(),
            description,
        };

        fs::create_dir_all(&self.out_dir).map_err(|e| render_err(e.to_string()))?;
        let path = self.out_dir.join(format!("{}.json", artifact.name));

        let document = HeatmapDocument::from(artifact);
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .map_err(|e| render_err(e.to_string()))?;

        fs::write(&path, json).map_err(|e| render_err(format!("{}: {}", path.display(), e)))?;
        info!("  -Heatmap: {} saved in path: {}", artifact.name, self.out_dir.display());
        Ok(path)
    }
}

// ----------------------------------------------------------------------------
// JSON document layout
// ----------------------------------------------------------------------------

/// On-disk layout of a heatmap artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapDocument {
    pub name: String,
    pub phase: Phase,
    pub vmin: f64,
    pub vmax: f64,
    pub color_map: ColorMap,
    pub planes: Vec<PlaneDocument>,
}

/// One plane of a [`HeatmapDocument`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneDocument {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// `[x_min, x_max, y_max, y_min]`
    pub extent: [f64; 4],
    pub y_limit: Option<[f64; 2]>,
    /// The renderer flips the vertical axis after drawing
    pub invert_y: bool,
    pub total_samples: usize,
    /// Rows follow the second axis, columns the first
    pub values: Vec<Vec<f64>>,
}

impl From<&PlaneHeatmap> for PlaneDocument {
    fn from(plane: &PlaneHeatmap) -> Self {
        Self {
            title: plane.title.clone(),
            x_label: plane.x_label.clone(),
            y_label: plane.y_label.clone(),
            extent: plane.grid.extent().as_array(),
            y_limit: plane.y_limit.map(|(lo, hi)| [lo, hi]),
            invert_y: true,
            total_samples: plane.grid.total_samples(),
            values: plane.grid.display_rows(),
        }
    }
}

impl From<&HeatmapArtifact> for HeatmapDocument {
    fn from(artifact: &HeatmapArtifact) -> Self {
        Self {
            name: artifact.name.clone(),
            phase: artifact.phase,
            vmin: artifact.vmin,
            vmax: artifact.vmax,
            color_map: artifact.color_map,
            planes: vec![
                PlaneDocument::from(&artifact.xy),
                PlaneDocument::from(&artifact.xz),
            ],
        }
    }
}
