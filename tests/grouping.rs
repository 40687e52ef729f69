//! Side-flip, alignment and aggregation tests

mod helpers;

use flydra_odor_analysis::{
    AlignmentOffset, AnalysisError, AnchorProvider, AnchorTable, Aggregator, CueSide,
    ExperimentRecord, NoAnchors, Phase,
};

use helpers::assertions::{assert_scalar_close, assert_vec_close};
use helpers::fixtures::{experiment_config, labelled, samples_at};

fn co2_record(date: &str, cue_y: &str, timestamps: &[f64], x: f64) -> ExperimentRecord {
    labelled(experiment_config(date, cue_y), samples_at(timestamps, x, 0.1, 0.2))
}

#[test]
fn test_side_flip_applied_once() {
    let record = co2_record("a", "-0.15", &[11.0, 12.0], 0.0);

    let flipped = record.apply_side_flip(CueSide::Positive);
    assert!(flipped.is_y_flipped());
    assert_vec_close(flipped.samples().y(), &[-0.1, -0.1], 0.0, "flipped y");

    // A second request, even towards the other side, is refused
    let again = flipped.apply_side_flip(CueSide::Negative);
    assert_vec_close(again.samples().y(), &[-0.1, -0.1], 0.0, "refused flip");
}

#[test]
fn test_grouping_key_parsing() {
    assert_eq!("grpPve".parse::<CueSide>().unwrap(), CueSide::Positive);
    assert_eq!("Nve".parse::<CueSide>().unwrap(), CueSide::Negative);
    assert!(matches!(
        "left".parse::<CueSide>(),
        Err(AnalysisError::Configuration { .. })
    ));
    // Negative zero counts as the negative side
    assert_eq!(CueSide::of(-0.0), CueSide::Negative);
}

#[test]
fn test_no_anchor_leaves_coordinates_unchanged() {
    let record = co2_record("a", "-0.15", &[11.0, 12.0], 0.3);
    let offset = AlignmentOffset::for_record(&record, 0.9);
    assert!(offset.is_zero());

    let mut agg = Aggregator::new(Phase::Co2);
    agg.add(&record, offset).unwrap();
    assert_vec_close(&agg.samples().x, &[0.3, 0.3], 0.0, "x");
    assert_vec_close(&agg.samples().y, &[0.1, 0.1], 0.0, "y");
}

#[test]
fn test_non_finite_anchor_is_ignored() {
    let offset = AlignmentOffset::resolve(0.9, (0.2, -0.15), Some((f64::NAN, 0.0)));
    assert_eq!(offset, AlignmentOffset::ZERO);
}

#[test]
fn test_anchor_offset_moves_anchor_onto_cue() {
    let offset = AlignmentOffset::resolve(0.9, (0.2, -0.15), Some((-0.6, -0.1)));
    assert_scalar_close(offset.dx, -0.7 + 0.6, 1e-12, "dx");
    assert_scalar_close(offset.dy, -0.15 + 0.1, 1e-12, "dy");

    let mut x = vec![-0.6];
    let mut y = vec![-0.1];
    offset.apply(&mut x, &mut y);
    assert_scalar_close(x[0], -0.7, 1e-12, "aligned x");
    assert_scalar_close(y[0], -0.15, 1e-12, "aligned y");
}

#[test]
fn test_config_anchor_wins_over_table() {
    let yaml = format!(
        "{}cuePosToAlign: [-0.5, 0.0]\n",
        helpers::fixtures::experiment_yaml("a", "-0.15", helpers::fixtures::BOUNDARIES)
    );
    let record = ExperimentRecord::from_config(serde_yaml::from_str(&yaml).unwrap());

    let mut table = AnchorTable::new();
    table.insert("a", (0.1, 0.1));
    table.insert("b", (0.2, 0.2));
    assert_eq!(table.anchor_for(&record), Some((-0.5, 0.0)));

    let other = ExperimentRecord::from_config(experiment_config("b", "0.15"));
    assert_eq!(table.anchor_for(&other), Some((0.2, 0.2)));
    assert_eq!(NoAnchors.anchor_for(&other), None);
}

#[test]
fn test_anchor_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("anchors.yaml");
    std::fs::write(&yaml, "\"20190320\": [-0.41, 0.12]\n\"20190321\": [-0.39, 0.14]\n").unwrap();
    assert_eq!(AnchorTable::load(&yaml).unwrap().len(), 2);

    let json = dir.path().join("anchors.json");
    std::fs::write(&json, r#"{"20190320": [-0.41, 0.12]}"#).unwrap();
    assert_eq!(AnchorTable::load(&json).unwrap().len(), 1);

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[1, 2").unwrap();
    assert!(matches!(
        AnchorTable::load(&broken),
        Err(AnalysisError::Configuration { .. })
    ));
}

#[test]
fn test_aggregator_concatenates_in_experiment_order() {
    // A has 3 CO2 samples, B has 2
    let a = co2_record("a", "-0.15", &[11.0, 12.0, 13.0, 5.0], 0.1);
    let b = co2_record("b", "0.15", &[15.0, 16.0, 25.0], 0.2);

    let mut agg = Aggregator::new(Phase::Co2);
    agg.add(&a, AlignmentOffset::ZERO).unwrap();
    agg.add(&b, AlignmentOffset::ZERO).unwrap();

    assert_eq!(agg.experiments(), &[("a".to_string(), 3), ("b".to_string(), 2)]);
    let pooled = agg.finish();
    assert_eq!(pooled.len(), 5);
    assert_vec_close(&pooled.x, &[0.1, 0.1, 0.1, 0.2, 0.2], 0.0, "pooled x");
    assert!(pooled.phases.iter().all(|&p| p == Phase::Co2));
}

#[test]
fn test_flip_then_pool() {
    let a = co2_record("a", "-0.15", &[11.0], 0.1).apply_side_flip(CueSide::Positive);
    let b = co2_record("b", "0.15", &[12.0], 0.1).apply_side_flip(CueSide::Positive);

    let mut agg = Aggregator::new(Phase::Co2);
    agg.add(&a, AlignmentOffset::ZERO).unwrap();
    agg.add(&b, AlignmentOffset::ZERO).unwrap();
    assert_vec_close(&agg.samples().y, &[-0.1, 0.1], 0.0, "pooled y");
}
