//! Error types for the analysis pipeline
//!
//! Every fallible step returns [`AnalysisError`]. The batch driver catches
//! these per experiment, logs them and moves on to the next experiment.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while loading, filtering or summarising an experiment
#[derive(Debug)]
pub enum AnalysisError {
    /// Experiment configuration missing or malformed
    ConfigLoad {
        /// Configuration file that failed
        path: PathBuf,
        /// What went wrong
        description: String,
    },

    /// Raw sample source missing or corrupt
    DataLoad {
        /// Data-source identifier (the experiment's file-name token)
        source_id: String,
        /// What went wrong
        description: String,
    },

    /// Phase label counts do not add up to the sample count
    Integrity {
        /// Experiment identifier
        experiment: String,
        /// Sum of the AIR, CO2 and POST_CO2 interval counts
        labelled: usize,
        /// Number of samples that had to be labelled
        total: usize,
    },

    /// Heatmap artifact could not be written
    Render {
        /// Artifact name
        name: String,
        /// What went wrong
        description: String,
    },

    /// Parallel arrays (or grids) disagree in length
    DimensionMismatch {
        /// What was expected
        expected: usize,
        /// What was received
        actual: usize,
        /// Which array
        context: String,
    },

    /// Run configuration is unusable
    Configuration {
        /// Description of the configuration issue
        description: String,
    },

    /// A phase-dependent step ran on a record that has no phase labels
    Unlabelled {
        /// Experiment identifier
        experiment: String,
    },

    /// Underlying IO failure
    Io(std::io::Error),
}

impl AnalysisError {
    /// Shorthand for a [`AnalysisError::Configuration`] error
    pub fn configuration(description: impl Into<String>) -> Self {
        AnalysisError::Configuration {
            description: description.into(),
        }
    }

    /// Whether the batch may skip the affected experiment and carry on.
    ///
    /// Only run-level configuration problems abort a batch.
    pub fn is_per_experiment(&self) -> bool {
        !matches!(self, AnalysisError::Configuration { .. })
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::ConfigLoad { path, description } => {
                write!(
                    f,
                    "Failed to load experiment configuration {}: {}",
                    path.display(),
                    description
                )
            }
            AnalysisError::DataLoad {
                source_id,
                description,
            } => {
                write!(f, "Failed to load samples for {}: {}", source_id, description)
            }
            AnalysisError::Integrity {
                experiment,
                labelled,
                total,
            } => {
                write!(
                    f,
                    "Phase labels for experiment {} do not match the sample count: {} labelled, {} samples",
                    experiment, labelled, total
                )
            }
            AnalysisError::Render { name, description } => {
                write!(f, "Failed to write heatmap {}: {}", name, description)
            }
            AnalysisError::DimensionMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    context, expected, actual
                )
            }
            AnalysisError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
            AnalysisError::Unlabelled { experiment } => {
                write!(f, "Experiment {} has no phase labels", experiment)
            }
            AnalysisError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Io(e)
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, AnalysisError>;
