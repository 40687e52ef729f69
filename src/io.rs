//! Reading raw samples and discovering experiments
//!
//! The tracker exports each recording's trajectory table; a
//! [`SampleReader`] turns one of those tables into [`SampleArrays`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::experiment::SampleArrays;

/// Source of raw trajectory samples
pub trait SampleReader {
    /// Read the six parallel arrays of one recording.
    ///
    /// # Arguments
    /// * `source_id` - Recording identifier (the experiment's `fileName`)
    /// * `dataset` - Table inside the recording
    fn read(&self, source_id: &str, dataset: &str) -> Result<SampleArrays>;
}

/// One row of an exported trajectory table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub obj_id: i64,
    pub frame: i64,
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Reads CSV exports with header `obj_id,frame,timestamp,x,y,z`.
///
/// The table for recording `20190320_114703.mainbrain.h5` and dataset
/// `kalman_estimates` is `<root>/20190320_114703.mainbrain.kalman_estimates.csv`.
#[derive(Debug, Clone)]
pub struct CsvSampleReader {
    root: PathBuf,
}

impl CsvSampleReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the table for a recording and dataset
    pub fn table_path(&self, source_id: &str, dataset: &str) -> PathBuf {
        self.root
            .join(source_id)
            .with_extension(format!("{}.csv", dataset))
    }

    /// Write a table in the layout this reader expects
    pub fn write_table(path: &Path, samples: &SampleArrays) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| AnalysisError::DataLoad {
            source_id: path.display().to_string(),
            description: e.to_string(),
        })?;
        for i in 0..samples.len() {
            let row = SampleRow {
                obj_id: samples.obj_ids()[i],
                frame: samples.frames()[i],
                timestamp: samples.timestamps()[i],
                x: samples.x()[i],
                y: samples.y()[i],
                z: samples.z()[i],
            };
            writer.serialize(row).map_err(|e| AnalysisError::DataLoad {
                source_id: path.display().to_string(),
                description: e.to_string(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl SampleReader for CsvSampleReader {
    fn read(&self, source_id: &str, dataset: &str) -> Result<SampleArrays> {
        let path = self.table_path(source_id, dataset);
        let data_err = |description: String| AnalysisError::DataLoad {
            source_id: source_id.to_string(),
            description,
        };

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| data_err(format!("{}: {}", path.display(), e)))?;

        let mut obj_ids = Vec::new();
        let mut frames = Vec::new();
        let mut timestamps = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();

        for (line, row) in reader.deserialize::<SampleRow>().enumerate() {
            let row = row.map_err(|e| data_err(format!("{} row {}: {}", path.display(), line + 1, e)))?;
            obj_ids.push(row.obj_id);
            frames.push(row.frame);
            timestamps.push(row.timestamp);
            x.push(row.x);
            y.push(row.y);
            z.push(row.z);
        }

        SampleArrays::new(obj_ids, frames, timestamps, x, y, z)
    }
}

/// Experiment configuration files in `dir` with the given extension, sorted
/// by name so batches run in a stable order
pub fn find_experiment_configs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let wanted = extension.trim_start_matches('.');
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|e| e.eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_path_replaces_extension() {
        let reader = CsvSampleReader::new("/data");
        assert_eq!(
            reader.table_path("20190320_114703.mainbrain.h5", "kalman_estimates"),
            PathBuf::from("/data/20190320_114703.mainbrain.kalman_estimates.csv")
        );
    }

    #[test]
    fn test_roundtrip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let samples = SampleArrays::new(
            vec![1, 2],
            vec![10, 11],
            vec![0.5, 0.6],
            vec![0.1, -0.1],
            vec![0.2, -0.2],
            vec![0.3, 0.4],
        )
        .unwrap();
        let reader = CsvSampleReader::new(dir.path());
        let path = reader.table_path("exp.mainbrain.h5", "kalman_estimates");
        CsvSampleReader::write_table(&path, &samples).unwrap();

        let loaded = reader.read("exp.mainbrain.h5", "kalman_estimates").unwrap();
        assert_eq!(loaded, samples);
    }

    #[test]
    fn test_missing_table_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvSampleReader::new(dir.path())
            .read("missing.h5", "kalman_estimates")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataLoad { .. }));
    }

    #[test]
    fn test_corrupt_row_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.kalman_estimates.csv");
        fs::write(&path, "obj_id,frame,timestamp,x,y,z\n1,2,zero,0,0,0\n").unwrap();
        let err = CsvSampleReader::new(dir.path())
            .read("bad.h5", "kalman_estimates")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DataLoad { .. }));
    }

    #[test]
    fn test_find_configs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yaml", "c.csv"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let found = find_experiment_configs(dir.path(), ".yaml").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml"]);
    }
}
