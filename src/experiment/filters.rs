//! Pure sample filters
//!
//! Each filter produces a boolean mask over the samples; the record applies
//! the mask to all six parallel arrays at once.
//!
//! - [`time_window_mask`] - drop samples recorded outside the experiment
//! - [`SpatialBounds::mask`] - drop samples outside the wind-tunnel volume
//! - [`label_phases`] - assign AIR / CO2 / POST_CO2 to the survivors

use serde::{Deserialize, Serialize};

use super::types::Phase;
use crate::common::constants::TUNNEL_FLOOR_Z;

// ============================================================================
// Phase boundaries
// ============================================================================

/// The four stimulus timestamps of an experiment.
///
/// They define three contiguous intervals: `[start, co2_onset)` is AIR,
/// `[co2_onset, post_co2_onset)` is CO2 and `[post_co2_onset, end]` is
/// POST_CO2. Only the last interval is closed on the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseBoundaries {
    /// Experiment start
    pub start: f64,
    /// Odor onset
    pub co2_onset: f64,
    /// Odor switched off
    pub post_co2_onset: f64,
    /// Experiment end
    pub end: f64,
}

impl PhaseBoundaries {
    pub fn new(start: f64, co2_onset: f64, post_co2_onset: f64, end: f64) -> Self {
        Self {
            start,
            co2_onset,
            post_co2_onset,
            end,
        }
    }

    /// `start <= co2_onset <= post_co2_onset <= end`
    pub fn is_ordered(&self) -> bool {
        self.start <= self.co2_onset
            && self.co2_onset <= self.post_co2_onset
            && self.post_co2_onset <= self.end
    }

    /// Whether `t` lies inside `[start, end]`
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Whether `t` lies inside the interval belonging to `phase`
    #[inline]
    pub fn in_phase(&self, t: f64, phase: Phase) -> bool {
        match phase {
            Phase::Air => t >= self.start && t < self.co2_onset,
            Phase::Co2 => t >= self.co2_onset && t < self.post_co2_onset,
            Phase::PostCo2 => t >= self.post_co2_onset && t <= self.end,
        }
    }

    /// Total experiment duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Mask of timestamps inside `[start, end]` (inclusive on both ends).
///
/// NaN timestamps never satisfy the comparison and are dropped.
pub fn time_window_mask(timestamps: &[f64], bounds: &PhaseBoundaries) -> Vec<bool> {
    timestamps.iter().map(|&t| bounds.contains(t)).collect()
}

// ============================================================================
// Spatial bounds
// ============================================================================

/// Axis-aligned tracking volume of the wind tunnel.
///
/// `x ∈ [-lim_x, lim_x]`, `y ∈ [-lim_y, lim_y]`, `z ∈ [0, lim_x]`. The Z
/// ceiling reuses `lim_x`; the rig's analyses have always been run this way
/// and results are only comparable if it stays that way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialBounds {
    /// Half-length of the test section along X
    pub lim_x: f64,
    /// Half-width of the test section along Y
    pub lim_y: f64,
}

impl SpatialBounds {
    pub fn new(lim_x: f64, lim_y: f64) -> Self {
        Self { lim_x, lim_y }
    }

    /// Z ceiling of the volume (same value as `lim_x`)
    #[inline]
    pub fn z_ceiling(&self) -> f64 {
        self.lim_x
    }

    /// Whether a single position lies inside the volume
    #[inline]
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        (x >= -self.lim_x && x <= self.lim_x)
            && (y >= -self.lim_y && y <= self.lim_y)
            && (z >= TUNNEL_FLOOR_Z && z <= self.z_ceiling())
    }

    /// Mask of positions inside the volume.
    ///
    /// The three per-axis masks are computed over the same index base and
    /// then intersected.
    pub fn mask(&self, x: &[f64], y: &[f64], z: &[f64]) -> Vec<bool> {
        let in_x = x.iter().map(|&v| v >= -self.lim_x && v <= self.lim_x);
        let in_y = y.iter().map(|&v| v >= -self.lim_y && v <= self.lim_y);
        let in_z = z
            .iter()
            .map(|&v| v >= TUNNEL_FLOOR_Z && v <= self.z_ceiling());

        in_x.zip(in_y)
            .zip(in_z)
            .map(|((ix, iy), iz)| ix && iy && iz)
            .collect()
    }
}

// ============================================================================
// Phase labelling
// ============================================================================

/// Per-phase interval counts produced while labelling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub air: usize,
    pub co2: usize,
    pub post_co2: usize,
}

impl PhaseCounts {
    /// Sum over the three phases
    #[inline]
    pub fn total(&self) -> usize {
        self.air + self.co2 + self.post_co2
    }

    /// Count for one phase
    pub fn get(&self, phase: Phase) -> usize {
        match phase {
            Phase::Air => self.air,
            Phase::Co2 => self.co2,
            Phase::PostCo2 => self.post_co2,
        }
    }
}

/// Outcome of [`label_phases`]
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseLabelling {
    /// Every sample fell into exactly one interval
    Complete {
        labels: Vec<Phase>,
        counts: PhaseCounts,
    },
    /// Interval counts disagree with the sample count.
    ///
    /// Happens when the boundaries are misconfigured (out of order, NaN) or
    /// when unfiltered samples are passed in. No labels are produced.
    Inconsistent { counts: PhaseCounts, total: usize },
}

/// Assign a phase to every timestamp.
///
/// The three interval counts are taken independently, exactly like a
/// per-interval `where`; labels are only produced if the counts add up to
/// the number of samples.
///
/// # Arguments
/// * `timestamps` - Timestamps that already passed [`time_window_mask`]
/// * `bounds` - Phase boundaries of the experiment
pub fn label_phases(timestamps: &[f64], bounds: &PhaseBoundaries) -> PhaseLabelling {
    let mut counts = PhaseCounts::default();
    let mut labels = Vec::with_capacity(timestamps.len());

    for &t in timestamps {
        let mut label = None;
        for phase in Phase::ALL {
            if bounds.in_phase(t, phase) {
                match phase {
                    Phase::Air => counts.air += 1,
                    Phase::Co2 => counts.co2 += 1,
                    Phase::PostCo2 => counts.post_co2 += 1,
                }
                label.get_or_insert(phase);
            }
        }
        if let Some(phase) = label {
            labels.push(phase);
        }
    }

    if counts.total() == timestamps.len() && labels.len() == timestamps.len() {
        PhaseLabelling::Complete { labels, counts }
    } else {
        PhaseLabelling::Inconsistent {
            counts,
            total: timestamps.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> PhaseBoundaries {
        PhaseBoundaries::new(0.0, 10.0, 20.0, 30.0)
    }

    #[test]
    fn test_time_window_inclusive() {
        let ts = [-0.1, 0.0, 15.0, 30.0, 30.1, f64::NAN];
        assert_eq!(
            time_window_mask(&ts, &bounds()),
            vec![false, true, true, true, false, false]
        );
    }

    #[test]
    fn test_boundary_labels() {
        let ts = [0.0, 9.9, 10.0, 19.9, 20.0, 30.0];
        match label_phases(&ts, &bounds()) {
            PhaseLabelling::Complete { labels, counts } => {
                let codes: Vec<u8> = labels.iter().map(|p| p.code()).collect();
                assert_eq!(codes, vec![1, 1, 2, 2, 3, 3]);
                assert_eq!(counts.total(), 6);
                assert_eq!(counts.get(Phase::Co2), 2);
            }
            other => panic!("expected complete labelling, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_labelling_is_complete() {
        assert!(matches!(
            label_phases(&[], &bounds()),
            PhaseLabelling::Complete { ref labels, .. } if labels.is_empty()
        ));
    }

    #[test]
    fn test_unfiltered_sample_is_inconsistent() {
        // 31.0 is past the end and belongs to no interval
        let result = label_phases(&[5.0, 31.0], &bounds());
        assert_eq!(
            result,
            PhaseLabelling::Inconsistent {
                counts: PhaseCounts {
                    air: 1,
                    co2: 0,
                    post_co2: 0
                },
                total: 2
            }
        );
    }

    #[test]
    fn test_overlapping_boundaries_are_inconsistent() {
        // post before onset: POST interval swallows AIR samples
        let bad = PhaseBoundaries::new(0.0, 10.0, 5.0, 30.0);
        assert!(!bad.is_ordered());
        assert!(matches!(
            label_phases(&[7.0, 12.0], &bad),
            PhaseLabelling::Inconsistent { total: 2, .. }
        ));
    }

    #[test]
    fn test_spatial_mask_uses_x_limit_for_z() {
        let b = SpatialBounds::new(1.0, 0.3);
        let x = [0.0, 0.0, 0.0, 1.0, -1.01, 0.0];
        let y = [0.0, 0.31, 0.0, -0.3, 0.0, 0.0];
        let z = [0.9, 0.1, -0.01, 1.0, 0.5, 1.01];
        assert_eq!(
            b.mask(&x, &y, &z),
            vec![true, false, false, true, false, false]
        );
        assert!(b.contains(0.0, 0.0, 0.9));
    }
}
