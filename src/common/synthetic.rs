//! Synthetic experiment generation
//!
//! Seeded random recordings with the quirks of real tracker output: object
//! ids recur over time, some tracks start before the experiment or run past
//! its end, and a fraction of samples fall outside the tracking volume.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::errors::{AnalysisError, Result};
use crate::experiment::{ExperimentConfig, SampleArrays};

/// Shape of a generated recording
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticScenario {
    pub exp_date: String,
    /// Number of tracks (trajectory fragments)
    pub tracks: usize,
    /// Samples per track
    pub samples_per_track: usize,
    /// Distinct object ids; tracks beyond this reuse ids
    pub id_pool: usize,
    /// Tracker frame rate (Hz)
    pub frame_rate: f64,
    /// Phase boundaries: start, CO2 onset, post-CO2 onset, end
    pub boundaries: [f64; 4],
    /// Tunnel half-length / half-width
    pub lim_x: f64,
    pub lim_y: f64,
    /// Standard deviation of one random-walk step (metres)
    pub step_std: f64,
    /// Probability that a sample is pushed outside the tracking volume
    pub outlier_fraction: f64,
    /// Test cue on positive Y when true
    pub test_cue_positive: bool,
}

impl Default for SyntheticScenario {
    fn default() -> Self {
        Self {
            exp_date: "20190320".to_string(),
            tracks: 40,
            samples_per_track: 50,
            id_pool: 25,
            frame_rate: 10.0,
            boundaries: [0.0, 60.0, 120.0, 180.0],
            lim_x: 0.9,
            lim_y: 0.3,
            step_std: 0.01,
            outlier_fraction: 0.05,
            test_cue_positive: false,
        }
    }
}

/// Generated configuration plus its raw (unfiltered) samples
#[derive(Debug, Clone)]
pub struct SyntheticExperiment {
    pub config: ExperimentConfig,
    pub samples: SampleArrays,
}

impl SyntheticScenario {
    /// Experiment configuration matching this scenario
    pub fn config(&self) -> ExperimentConfig {
        let [start, co2, post, end] = self.boundaries;
        let cue_y = if self.test_cue_positive { 0.15 } else { -0.15 };
        ExperimentConfig {
            exp_date: self.exp_date.clone(),
            file_name: format!("{}_114703.mainbrain.h5", self.exp_date),
            exp_type: "mosquito".to_string(),
            gender: "female".to_string(),
            base_color: "white".to_string(),
            test_color: "black".to_string(),
            odor_position: Some([0.0, 0.0, 0.0]),
            base_cue_position: [0.2, -cue_y, 0.0],
            test_cue_position: [0.2, cue_y, 0.0],
            ts_start: start,
            ts_co2: co2,
            ts_post_co2: post,
            ts_end: end,
            cue_pos_to_align: None,
        }
    }

    /// Generate a recording from `seed`.
    ///
    /// Rows come out sorted by timestamp, the way the tracker writes them.
    pub fn generate(&self, seed: u64) -> Result<SyntheticExperiment> {
        let mut rng = StdRng::seed_from_u64(seed);
        let step = Normal::new(0.0, self.step_std).map_err(|e| {
            AnalysisError::configuration(format!("invalid random-walk step: {}", e))
        })?;
        if !(self.frame_rate > 0.0) {
            return Err(AnalysisError::configuration("frame rate must be positive"));
        }

        let [start, _, _, end] = self.boundaries;
        let dt = 1.0 / self.frame_rate;
        let track_span = self.samples_per_track as f64 * dt;
        // Let some tracks begin before the start and end past the end
        let first_start = start - track_span / 2.0;
        let last_start = end + dt;
        let pool = self.id_pool.max(1) as i64;

        let mut rows: Vec<(i64, f64, f64, f64, f64)> =
            Vec::with_capacity(self.tracks * self.samples_per_track);
        for track in 0..self.tracks {
            let id = track as i64 % pool;
            let t0 = rng.gen_range(first_start..last_start.max(first_start + dt));
            let mut x = rng.gen_range(-self.lim_x..self.lim_x);
            let mut y = rng.gen_range(-self.lim_y..self.lim_y);
            let mut z = rng.gen_range(0.05..self.lim_x.min(0.6).max(0.1));

            for k in 0..self.samples_per_track {
                x = (x + step.sample(&mut rng)).clamp(-self.lim_x, self.lim_x);
                y = (y + step.sample(&mut rng)).clamp(-self.lim_y, self.lim_y);
                z = (z + step.sample(&mut rng)).clamp(0.0, self.lim_x);

                let (mut sx, mut sy, mut sz) = (x, y, z);
                if rng.gen_bool(self.outlier_fraction.clamp(0.0, 1.0)) {
                    match rng.gen_range(0..3) {
                        0 => sx = self.lim_x * 1.5,
                        1 => sy = -self.lim_y * 1.5,
                        _ => sz = -0.05,
                    }
                }
                rows.push((id, t0 + k as f64 * dt, sx, sy, sz));
            }
        }
        rows.sort_by(|a, b| a.1.total_cmp(&b.1));

        let n = rows.len();
        let mut obj_ids = Vec::with_capacity(n);
        let mut frames = Vec::with_capacity(n);
        let mut timestamps = Vec::with_capacity(n);
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let mut zs = Vec::with_capacity(n);
        for (id, t, x, y, z) in rows {
            obj_ids.push(id);
            frames.push(((t - first_start) * self.frame_rate).round() as i64);
            timestamps.push(t);
            xs.push(x);
            ys.push(y);
            zs.push(z);
        }

        Ok(SyntheticExperiment {
            config: self.config(),
            samples: SampleArrays::new(obj_ids, frames, timestamps, xs, ys, zs)?,
        })
    }
}
