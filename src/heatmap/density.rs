//! Normalised 2D occupancy histograms
//!
//! A [`DensityGrid`] bins a pair of coordinate slices into a fixed number of
//! bins and divides every bin by the number of binned samples, so the grid
//! is a relative-frequency distribution that sums to one. An empty input
//! gives an all-zero grid.
//!
//! Binning follows the usual `histogram2d` rules:
//! - each axis spans the data `[min, max]`
//! - a zero-width axis is widened by ±0.5
//! - an empty axis spans `[0, 1]`
//! - bins are half-open except the last one, which also holds `max`

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::common::constants::{DEFAULT_BINS, DEGENERATE_RANGE_PAD, EMPTY_HISTOGRAM_RANGE};
use crate::errors::{AnalysisError, Result};

// ============================================================================
// Bin count and extent
// ============================================================================

/// Number of bins along the first and second axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct BinCount {
    pub x: usize,
    pub y: usize,
}

impl BinCount {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Total number of bins
    #[inline]
    pub fn cells(&self) -> usize {
        self.x * self.y
    }
}

impl Default for BinCount {
    fn default() -> Self {
        Self::new(DEFAULT_BINS.0, DEFAULT_BINS.1)
    }
}

impl From<[usize; 2]> for BinCount {
    fn from([x, y]: [usize; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<BinCount> for [usize; 2] {
    fn from(bins: BinCount) -> Self {
        [bins.x, bins.y]
    }
}

/// Axis ranges of a grid, in display order.
///
/// The second axis is stored max-first because the renderer draws it
/// increasing downwards and then inverts it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub y_min: f64,
}

impl Extent {
    /// `[x_min, x_max, y_max, y_min]`
    pub fn as_array(&self) -> [f64; 4] {
        [self.x_min, self.x_max, self.y_max, self.y_min]
    }
}

// ============================================================================
// Binning helpers
// ============================================================================

/// Range spanned by the finite values of an axis
pub fn axis_range(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return EMPTY_HISTOGRAM_RANGE;
    }
    if min == max {
        return (min - DEGENERATE_RANGE_PAD, max + DEGENERATE_RANGE_PAD);
    }
    (min, max)
}

/// Bin holding `value`, or `None` if it falls outside `[min, max]`
#[inline]
pub fn bin_index(value: f64, (min, max): (f64, f64), bins: usize) -> Option<usize> {
    if !(value >= min && value <= max) || bins == 0 {
        return None;
    }
    if value == max {
        return Some(bins - 1);
    }
    let idx = ((value - min) / (max - min) * bins as f64).floor() as usize;
    Some(idx.min(bins - 1))
}

// ============================================================================
// DensityGrid
// ============================================================================

/// Relative-frequency 2D histogram over one spatial plane.
///
/// `values` has shape `(bins.x, bins.y)`; entry `(i, j)` is the fraction of
/// samples that fell in bin `i` of the first axis and bin `j` of the second.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    values: DMatrix<f64>,
    total: usize,
    extent: Extent,
}

impl DensityGrid {
    /// Bin and normalise a pair of coordinate slices.
    ///
    /// # Arguments
    /// * `first` - Coordinates along the first (horizontal) axis
    /// * `second` - Coordinates along the second axis, same length as `first`
    /// * `bins` - Number of bins per axis
    pub fn from_coordinates(first: &[f64], second: &[f64], bins: BinCount) -> Result<Self> {
        if first.len() != second.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: first.len(),
                actual: second.len(),
                context: "density grid coordinates".to_string(),
            });
        }
        if bins.x == 0 || bins.y == 0 {
            return Err(AnalysisError::configuration(format!(
                "heatmap bin counts must be positive, got {}x{}",
                bins.x, bins.y
            )));
        }

        let range_a = axis_range(first);
        let range_b = axis_range(second);

        let mut counts = DMatrix::<f64>::zeros(bins.x, bins.y);
        let mut total = 0usize;
        for (&a, &b) in first.iter().zip(second) {
            if let (Some(i), Some(j)) = (bin_index(a, range_a, bins.x), bin_index(b, range_b, bins.y)) {
                counts[(i, j)] += 1.0;
                total += 1;
            }
        }

        // Zero-sample selections stay all-zero instead of dividing by zero
        if total > 0 {
            counts /= total as f64;
        }

        Ok(Self {
            values: counts,
            total,
            extent: Extent {
                x_min: range_a.0,
                x_max: range_a.1,
                y_max: range_b.1,
                y_min: range_b.0,
            },
        })
    }

    /// Normalised values, shape `(bins.x, bins.y)`
    #[inline]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Value of bin `(i, j)`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get((i, j)).copied()
    }

    /// Number of samples that were binned (the normalisation denominator)
    #[inline]
    pub fn total_samples(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// `(bins.x, bins.y)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Sum over all bins (1 for non-empty input, 0 otherwise)
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Largest bin value
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Grid as drawn: rows follow the second axis, columns the first
    pub fn display_matrix(&self) -> DMatrix<f64> {
        self.values.transpose()
    }

    /// [`display_matrix`](Self::display_matrix) as nested rows
    pub fn display_rows(&self) -> Vec<Vec<f64>> {
        let display = self.display_matrix();
        display
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

// ============================================================================
// Plane pair
// ============================================================================

/// X-Y and X-Z grids built from the same selection.
///
/// Each plane is normalised by its own sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneDensities {
    pub xy: DensityGrid,
    pub xz: DensityGrid,
}

impl PlaneDensities {
    /// Build both planes
    #[cfg(not(feature = "rayon"))]
    pub fn build(x: &[f64], y: &[f64], z: &[f64], bins: BinCount) -> Result<Self> {
        let xy = DensityGrid::from_coordinates(x, y, bins)?;
        let xz = DensityGrid::from_coordinates(x, z, bins)?;
        Ok(Self { xy, xz })
    }

    /// Build both planes in parallel
    #[cfg(feature = "rayon")]
    pub fn build(x: &[f64], y: &[f64], z: &[f64], bins: BinCount) -> Result<Self> {
        let (xy, xz) = rayon::join(
            || DensityGrid::from_coordinates(x, y, bins),
            || DensityGrid::from_coordinates(x, z, bins),
        );
        Ok(Self { xy: xy?, xz: xz? })
    }
}
