/*!
Occupancy heatmaps.

- [`density`] - binning and normalisation into [`DensityGrid`]s
- [`sink`] - [`HeatmapArtifact`]s and the [`HeatmapSink`]s that persist them
*/

pub mod density;
pub mod sink;

pub use density::{axis_range, bin_index, BinCount, DensityGrid, Extent, PlaneDensities};
pub use sink::{
    experiment_artifact_name, group_artifact_name, ColorMap, HeatmapArtifact, HeatmapDocument,
    HeatmapSink, JsonHeatmapSink, MemorySink, PlaneDocument, PlaneHeatmap,
};
