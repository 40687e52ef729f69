/*!
Experiment records and the filters that narrow them.

- [`types`] - [`Phase`], [`TrajectorySample`], [`SampleArrays`]
- [`filters`] - time window, tracking volume and phase labelling
- [`record`] - [`ExperimentRecord`] and its configuration
*/

pub mod filters;
pub mod record;
pub mod types;

pub use filters::{
    label_phases, time_window_mask, PhaseBoundaries, PhaseCounts, PhaseLabelling, SpatialBounds,
};
pub use record::{load_experiment_config, ExperimentConfig, ExperimentRecord};
pub use types::{Phase, SampleArrays, TrajectorySample};
