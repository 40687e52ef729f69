//! Fixture builders
//!
//! Experiments are written to disk the way the rig leaves them: one YAML
//! configuration per experiment next to the exported trajectory table.

use std::fs;
use std::path::{Path, PathBuf};

use flydra_odor_analysis::common::synthetic::SyntheticScenario;
use flydra_odor_analysis::{
    CsvSampleReader, ExperimentConfig, ExperimentRecord, SampleArrays, SpatialBounds,
};

pub const DATASET: &str = "kalman_estimates";

/// Phase boundaries used by hand-written fixtures
pub const BOUNDARIES: [f64; 4] = [0.0, 10.0, 20.0, 30.0];

/// Experiment YAML with the given date, test-cue Y (as written, e.g. `-0.15`)
/// and phase boundaries
pub fn experiment_yaml(exp_date: &str, test_cue_y: &str, boundaries: [f64; 4]) -> String {
    let [start, co2, post, end] = boundaries;
    let base_y = if test_cue_y.trim().starts_with('-') {
        "0.15"
    } else {
        "-0.15"
    };
    format!(
        "expDate: {exp_date}\n\
         fileName: {exp_date}_114703.mainbrain.h5\n\
         type: mosquito\n\
         gender: female\n\
         clrBASE: white\n\
         clrTEST: black\n\
         posOdor: [0.0, 0.0, 0.0]\n\
         posClrBASE: ['0.2', '{base_y}', '0.0']\n\
         posClrTEST: ['0.2', '{test_cue_y}', '0.0']\n\
         ts_1_StartExp: {start:?}\n\
         ts_2_CO2: {co2:?}\n\
         ts_3_PostCO2: {post:?}\n\
         ts_4_EndExp: {end:?}\n"
    )
}

/// Config parsed from [`experiment_yaml`]
pub fn experiment_config(exp_date: &str, test_cue_y: &str) -> ExperimentConfig {
    serde_yaml::from_str(&experiment_yaml(exp_date, test_cue_y, BOUNDARIES)).unwrap()
}

/// Samples of a single object at fixed position
pub fn samples_at(timestamps: &[f64], x: f64, y: f64, z: f64) -> SampleArrays {
    let n = timestamps.len();
    SampleArrays::new(
        vec![1; n],
        (0..n as i64).collect(),
        timestamps.to_vec(),
        vec![x; n],
        vec![y; n],
        vec![z; n],
    )
    .unwrap()
}

/// Samples from explicit (id, t) pairs, all at the tunnel centre
pub fn samples_with_ids(rows: &[(i64, f64)]) -> SampleArrays {
    let n = rows.len();
    SampleArrays::new(
        rows.iter().map(|&(id, _)| id).collect(),
        (0..n as i64).collect(),
        rows.iter().map(|&(_, t)| t).collect(),
        vec![0.0; n],
        vec![0.0; n],
        vec![0.2; n],
    )
    .unwrap()
}

/// Record taken through every filtering stage
pub fn labelled(config: ExperimentConfig, samples: SampleArrays) -> ExperimentRecord {
    ExperimentRecord::from_config(config)
        .with_samples(samples)
        .apply_start_end_ts()
        .unwrap()
        .erase_pos_outside_wt(&SpatialBounds::new(0.9, 0.3))
        .unwrap()
        .set_odor_stim()
        .unwrap()
}

/// Write an experiment's YAML and trajectory table into `dir`
pub fn write_experiment(dir: &Path, config_yaml: &str, samples: &SampleArrays) -> PathBuf {
    let config: ExperimentConfig = serde_yaml::from_str(config_yaml).unwrap();
    let yaml_path = dir.join(format!("{}.yaml", config.exp_date));
    fs::write(&yaml_path, config_yaml).unwrap();

    let reader = CsvSampleReader::new(dir);
    let table = reader.table_path(&config.file_name, DATASET);
    CsvSampleReader::write_table(&table, samples).unwrap();
    yaml_path
}

/// Write a synthetic experiment into `dir`
pub fn write_synthetic(dir: &Path, scenario: &SyntheticScenario, seed: u64) -> PathBuf {
    let generated = scenario.generate(seed).unwrap();
    let yaml = serde_yaml::to_string(&generated.config).unwrap();
    write_experiment(dir, &yaml, &generated.samples)
}

/// Write an `ExpMetaData.yaml` run configuration into `dir`
pub fn write_run_config(dir: &Path, in_dir: &Path, out_dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("ExpMetaData.yaml");
    let yaml = format!(
        "IN_PATH: {}\n\
         OUT_PATH: {}\n\
         DATASET: {DATASET}\n\
         LIM_X: 0.9\n\
         LIM_Y: 0.3\n\
         ODOR: 2\n\
         MIN_FLIGHT_TIME: 0.5\n\
         NORM: 0.0001\n\
         HM_GRP_NAME: hm_grouped\n\
         NBINS: [60, 20]\n\
         {extra}",
        in_dir.display(),
        out_dir.display()
    );
    fs::write(&path, yaml).unwrap();
    path
}
