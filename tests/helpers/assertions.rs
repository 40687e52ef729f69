//! Assertion functions with tolerance and invariant checks

use flydra_odor_analysis::{DensityGrid, ExperimentRecord, SpatialBounds};

/// Compare scalar values with tolerance
pub fn assert_scalar_close(actual: f64, expected: f64, tolerance: f64, field_name: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {}, got {} (diff: {}, tolerance: {})",
        field_name,
        expected,
        actual,
        diff,
        tolerance
    );
}

/// Compare slices element-wise with tolerance
pub fn assert_vec_close(actual: &[f64], expected: &[f64], tolerance: f64, field_name: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch (actual: {}, expected: {})",
        field_name,
        actual.len(),
        expected.len()
    );

    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{}[{}]: expected {}, got {} (diff: {}, tolerance: {})",
            field_name,
            i,
            e,
            a,
            diff,
            tolerance
        );
    }
}

/// Every sample of a filtered record lies in the experiment window and the tracking volume
pub fn assert_filtered(record: &ExperimentRecord, bounds: &SpatialBounds) {
    let samples = record.samples();
    let n = samples.len();
    assert_eq!(samples.obj_ids().len(), n, "obj_id length");
    assert_eq!(samples.frames().len(), n, "frame length");
    assert_eq!(samples.timestamps().len(), n, "timestamp length");
    assert_eq!(samples.x().len(), n, "x length");
    assert_eq!(samples.y().len(), n, "y length");
    assert_eq!(samples.z().len(), n, "z length");

    let window = record.boundaries();
    for i in 0..n {
        let t = samples.timestamps()[i];
        assert!(
            t >= window.start && t <= window.end,
            "{}: sample {} at t={} outside [{}, {}]",
            record.exp_date(),
            i,
            t,
            window.start,
            window.end
        );
        assert!(
            bounds.contains(samples.x()[i], samples.y()[i], samples.z()[i]),
            "{}: sample {} at ({}, {}, {}) outside the tracking volume",
            record.exp_date(),
            i,
            samples.x()[i],
            samples.y()[i],
            samples.z()[i]
        );
    }
}

/// Grid sums to 1 when it binned anything, 0 otherwise
pub fn assert_normalised(grid: &DensityGrid, field_name: &str) {
    let expected = if grid.is_empty() { 0.0 } else { 1.0 };
    assert_scalar_close(grid.sum(), expected, 1e-9, field_name);
    assert!(
        grid.values().iter().all(|&v| v >= 0.0),
        "{}: negative density",
        field_name
    );
}
