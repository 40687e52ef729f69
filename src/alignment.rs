//! Cross-experiment alignment
//!
//! Two transforms bring experiments into a common frame before their
//! samples are pooled:
//!
//! 1. **Side flip** ([`CueSide`]): experiments whose test cue sits on the
//!    other side of the tunnel have their Y axis negated
//!    (see [`ExperimentRecord::apply_side_flip`](crate::experiment::ExperimentRecord::apply_side_flip)).
//! 2. **Offset** ([`AlignmentOffset`]): a per-experiment translation that
//!    moves a hand-picked anchor point onto the test-cue position.
//!
//! Anchors come from an [`AnchorProvider`]; picking them interactively is
//! outside this crate.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::experiment::ExperimentRecord;

// ============================================================================
// Cue side
// ============================================================================

/// Side of the tunnel (sign of Y) the test cue is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueSide {
    /// Test cue on positive Y (`GRP_BY: Pve`)
    #[serde(rename = "Pve")]
    Positive,
    /// Test cue on negative Y (`GRP_BY: Nve`)
    #[serde(rename = "Nve")]
    Negative,
}

impl CueSide {
    /// Side of a Y coordinate.
    ///
    /// Uses the sign bit, so `-0.0` counts as negative, the same as a
    /// coordinate written with a leading minus sign.
    pub fn of(y: f64) -> Self {
        if y.is_sign_negative() {
            CueSide::Negative
        } else {
            CueSide::Positive
        }
    }

    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            CueSide::Positive => CueSide::Negative,
            CueSide::Negative => CueSide::Positive,
        }
    }

    /// Whether an experiment with its test cue at `test_cue_y` needs its Y
    /// axis flipped to join a group on this side
    pub fn needs_flip(self, test_cue_y: f64) -> bool {
        CueSide::of(test_cue_y) != self
    }
}

impl FromStr for CueSide {
    type Err = AnalysisError;

    /// Accepts any string containing `Pve` or `Nve` (e.g. `grpByPve`)
    fn from_str(s: &str) -> Result<Self> {
        if s.contains("Pve") {
            Ok(CueSide::Positive)
        } else if s.contains("Nve") {
            Ok(CueSide::Negative)
        } else {
            Err(AnalysisError::configuration(format!(
                "unknown grouping key '{}' (expected Pve or Nve)",
                s
            )))
        }
    }
}

// ============================================================================
// Offset
// ============================================================================

/// Translation applied to one experiment's (x, y) before pooling
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentOffset {
    pub dx: f64,
    pub dy: f64,
}

impl AlignmentOffset {
    /// No translation
    pub const ZERO: AlignmentOffset = AlignmentOffset { dx: 0.0, dy: 0.0 };

    /// Offset that moves `anchor` onto the test cue.
    ///
    /// The rig's raw X axis is mirrored with respect to the heatmap display,
    /// so the target X is `(lim_x - cue_x) * -1`. A missing anchor, or one
    /// with a non-finite component, gives [`AlignmentOffset::ZERO`].
    ///
    /// # Arguments
    /// * `lim_x` - Half-length of the tunnel along X
    /// * `test_cue` - Test-cue (x, y) from the experiment configuration
    /// * `anchor` - Point picked on the rendered heatmap, if any
    pub fn resolve(lim_x: f64, test_cue: (f64, f64), anchor: Option<(f64, f64)>) -> Self {
        match anchor {
            Some((ax, ay)) if ax.is_finite() && ay.is_finite() => {
                let (cue_x, cue_y) = test_cue;
                let target_x = (lim_x - cue_x) * -1.0;
                AlignmentOffset {
                    dx: target_x - ax,
                    dy: cue_y - ay,
                }
            }
            _ => AlignmentOffset::ZERO,
        }
    }

    /// Offset for a record, using its own anchor
    pub fn for_record(record: &ExperimentRecord, lim_x: f64) -> Self {
        Self::resolve(lim_x, record.test_cue_xy(), record.anchor())
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// Translate coordinates in place
    pub fn apply(&self, x: &mut [f64], y: &mut [f64]) {
        for v in x.iter_mut() {
            *v += self.dx;
        }
        for v in y.iter_mut() {
            *v += self.dy;
        }
    }
}

// ============================================================================
// Anchor providers
// ============================================================================

/// Supplies the alignment anchor of an experiment, or none.
///
/// Stands in for the interactive step where an operator clicks the cue on a
/// rendered heatmap. Called between loading an experiment and pooling it.
pub trait AnchorProvider {
    fn anchor_for(&mut self, record: &ExperimentRecord) -> Option<(f64, f64)>;
}

/// Provider that never supplies an anchor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnchors;

impl AnchorProvider for NoAnchors {
    fn anchor_for(&mut self, _record: &ExperimentRecord) -> Option<(f64, f64)> {
        None
    }
}

/// Anchors keyed by experiment date, loaded from a YAML or JSON map:
///
/// ```yaml
/// "20190320": [-0.41, 0.12]
/// "20190321": [-0.39, 0.14]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AnchorTable {
    anchors: HashMap<String, [f64; 2]>,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, exp_date: impl Into<String>, anchor: (f64, f64)) {
        self.anchors.insert(exp_date.into(), [anchor.0, anchor.1]);
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Load from a `.json` file, or YAML for any other extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| {
            AnalysisError::configuration(format!("invalid anchor table {}: {}", path.display(), e))
        })
    }
}

impl AnchorProvider for AnchorTable {
    /// A `cuePosToAlign` in the experiment's own configuration wins over the table
    fn anchor_for(&mut self, record: &ExperimentRecord) -> Option<(f64, f64)> {
        record
            .anchor()
            .or_else(|| self.anchors.get(record.exp_date()).map(|&[x, y]| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_anchor_is_zero() {
        let offset = AlignmentOffset::resolve(0.9, (0.2, -0.15), None);
        assert!(offset.is_zero());

        let mut x = vec![0.1, 0.2];
        let mut y = vec![0.3, -0.4];
        offset.apply(&mut x, &mut y);
        assert_eq!(x, vec![0.1, 0.2]);
        assert_eq!(y, vec![0.3, -0.4]);
    }

    #[test]
    fn test_non_finite_anchor_is_zero() {
        assert!(AlignmentOffset::resolve(0.9, (0.2, 0.1), Some((f64::NAN, 0.0))).is_zero());
    }

    #[test]
    fn test_offset_formula() {
        // target_x = (0.9 - 0.2) * -1 = -0.7
        let offset = AlignmentOffset::resolve(0.9, (0.2, -0.15), Some((-0.6, -0.1)));
        assert!((offset.dx - (-0.1)).abs() < 1e-12);
        assert!((offset.dy - (-0.05)).abs() < 1e-12);

        let mut x = vec![0.0];
        let mut y = vec![0.0];
        offset.apply(&mut x, &mut y);
        assert!((x[0] + 0.1).abs() < 1e-12);
        assert!((y[0] + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_cue_side() {
        assert_eq!(CueSide::of(0.15), CueSide::Positive);
        assert_eq!(CueSide::of(-0.15), CueSide::Negative);
        assert_eq!(CueSide::of(-0.0), CueSide::Negative);
        assert!(CueSide::Positive.needs_flip(-0.15));
        assert!(!CueSide::Negative.needs_flip(-0.15));
        assert_eq!(CueSide::Positive.opposite(), CueSide::Negative);
    }

    #[test]
    fn test_cue_side_parse() {
        assert_eq!("Pve".parse::<CueSide>().unwrap(), CueSide::Positive);
        assert_eq!("grpNve".parse::<CueSide>().unwrap(), CueSide::Negative);
        assert!("left".parse::<CueSide>().is_err());
    }

    #[test]
    fn test_anchor_table_json() {
        let table: AnchorTable = serde_json::from_str(r#"{"20190320": [-0.4, 0.1]}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.anchors.get("20190320"), Some(&[-0.4, 0.1]));
    }
}
