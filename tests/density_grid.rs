//! Density grid tests
//!
//! Normalisation, shape, binning edges and the display orientation of the
//! X-Y / X-Z heatmap planes.

mod helpers;

use flydra_odor_analysis::common::synthetic::SyntheticScenario;
use flydra_odor_analysis::heatmap::{axis_range, bin_index};
use flydra_odor_analysis::{
    AnalysisError, BinCount, DensityGrid, HeatmapArtifact, Phase, PlaneDensities,
};

use helpers::assertions::{assert_normalised, assert_scalar_close};
use helpers::fixtures::{experiment_config, labelled};

#[test]
fn test_phase_grids_sum_to_one_with_configured_shape() {
    let generated = SyntheticScenario::default().generate(11).unwrap();
    let record = labelled(generated.config, generated.samples);
    let bins = BinCount::new(60, 20);

    for phase in Phase::ALL {
        let (x, y, z) = record.phase_coordinates(phase).unwrap();
        let planes = PlaneDensities::build(&x, &y, &z, bins).unwrap();
        assert_eq!(planes.xy.shape(), (60, 20));
        assert_eq!(planes.xz.shape(), (60, 20));
        assert_eq!(planes.xy.total_samples(), x.len());
        assert_normalised(&planes.xy, &format!("{} x-y", phase));
        assert_normalised(&planes.xz, &format!("{} x-z", phase));
    }
}

#[test]
fn test_empty_selection_gives_zero_grid() {
    let planes = PlaneDensities::build(&[], &[], &[], BinCount::default()).unwrap();
    assert_eq!(planes.xy.shape(), (600, 200));
    assert_eq!(planes.xy.sum(), 0.0);
    assert_eq!(planes.xz.max_value(), 0.0);
}

#[test]
fn test_default_bins_are_600_by_200() {
    assert_eq!(BinCount::default(), BinCount::new(600, 200));
    assert_eq!(BinCount::default().cells(), 120_000);
}

#[test]
fn test_histogram_edges() {
    assert_eq!(axis_range(&[]), (0.0, 1.0));
    assert_eq!(axis_range(&[2.0, 2.0]), (1.5, 2.5));
    assert_eq!(axis_range(&[-1.0, 3.0, 0.0]), (-1.0, 3.0));

    // Half-open bins, last one closed
    assert_eq!(bin_index(0.0, (0.0, 1.0), 4), Some(0));
    assert_eq!(bin_index(0.25, (0.0, 1.0), 4), Some(1));
    assert_eq!(bin_index(1.0, (0.0, 1.0), 4), Some(3));
    assert_eq!(bin_index(1.01, (0.0, 1.0), 4), None);
}

#[test]
fn test_display_matrix_is_transposed() {
    // Three samples in first-axis bin 0, one in bin 1; second axis split 2/2
    let grid = DensityGrid::from_coordinates(
        &[0.0, 0.0, 0.0, 1.0],
        &[0.0, 0.0, 1.0, 1.0],
        BinCount::new(2, 2),
    )
    .unwrap();

    assert_scalar_close(grid.get(0, 0).unwrap(), 0.5, 1e-12, "(0, 0)");
    assert_scalar_close(grid.get(0, 1).unwrap(), 0.25, 1e-12, "(0, 1)");
    assert_scalar_close(grid.get(1, 1).unwrap(), 0.25, 1e-12, "(1, 1)");

    let display = grid.display_matrix();
    assert_eq!(display.shape(), (2, 2));
    assert_eq!(display[(1, 0)], grid.get(0, 1).unwrap());
    assert_eq!(grid.extent().as_array(), [0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_planes_have_independent_denominators() {
    // A NaN Z drops out of the X-Z plane only
    let planes = PlaneDensities::build(
        &[0.0, 0.5, 1.0],
        &[0.0, 0.1, 0.2],
        &[0.1, f64::NAN, 0.3],
        BinCount::new(3, 3),
    )
    .unwrap();
    assert_eq!(planes.xy.total_samples(), 3);
    assert_eq!(planes.xz.total_samples(), 2);
    assert_normalised(&planes.xy, "x-y");
    assert_normalised(&planes.xz, "x-z");
}

#[test]
fn test_mismatched_coordinates_rejected() {
    let err = DensityGrid::from_coordinates(&[0.0, 1.0], &[0.0], BinCount::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::DimensionMismatch { .. }));
}

#[test]
fn test_experiment_artifact_metadata() {
    let config = experiment_config("20190320", "-0.15");
    let planes = PlaneDensities::build(&[0.0], &[0.0], &[0.2], BinCount::new(4, 2)).unwrap();
    let artifact = HeatmapArtifact::for_experiment(&config, Phase::PostCo2, planes, 0.0001);

    assert_eq!(artifact.name, "hm_20190320_white_vs_black_3_PostCO2");
    assert_eq!(artifact.xy.title, "heatmap black vs white x-y axis with stim= PostCO2");
    assert_eq!(artifact.xz.y_label, "Z axis");
    assert_eq!(artifact.vmin, 0.0);
    assert_eq!(artifact.vmax, 0.0001);
}
