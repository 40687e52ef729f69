//! Rig and display constants
//!
//! These are conventions of the wind-tunnel rig and of the heatmaps the lab
//! has always produced. They are separate from [`RunConfig`](crate::config::RunConfig),
//! which carries the per-run, user-configurable values.

/// Default heatmap bin counts `(x, second axis)`.
///
/// Fixed by convention, never derived from the data.
pub const DEFAULT_BINS: (usize, usize) = (600, 200);

/// Default colour-scale ceiling for normalised heatmaps.
///
/// A bin holding 0.01% of all samples saturates the colour map.
pub const DEFAULT_NORM_CEILING: f64 = 0.0001;

/// Upper display limit of the Z axis in X-Z heatmaps (metres).
pub const XZ_DISPLAY_Z_LIMIT: f64 = 0.6;

/// Lower bound of the tracking volume on the Z axis (the tunnel floor).
pub const TUNNEL_FLOOR_Z: f64 = 0.0;

/// Range used by the binning step when a histogram has no samples.
pub const EMPTY_HISTOGRAM_RANGE: (f64, f64) = (0.0, 1.0);

/// Half-width added around a degenerate (zero-width) histogram range.
pub const DEGENERATE_RANGE_PAD: f64 = 0.5;

/// Tolerance used when checking that a normalised grid sums to one.
pub const NORMALISATION_TOLERANCE: f64 = 1e-9;
