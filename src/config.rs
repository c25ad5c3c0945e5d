//! Run configuration.
//!
//! All tunables live in a [`Config`] value that is built once (defaults, then an
//! optional JSON file, then command-line overrides) and passed into the
//! components that need it. Nothing is read from process-wide state.
//!
//! ## Example file
//!
//! ```json
//! {
//!   "pipeline": { "window_size": 300, "overlap": 150, "concurrency": 2 },
//!   "prediction": { "timeout_secs": 120 },
//!   "topology": { "invariant": "jones", "sample_count": 200 }
//! }
//! ```
//!
//! Omitted fields keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sequences longer than this are analyzed in sliding-window mode
pub const DEFAULT_SINGLE_SHOT_LIMIT: usize = 400;
pub const DEFAULT_WINDOW_SIZE: usize = 400;
pub const DEFAULT_OVERLAP: usize = 200;
/// Trailing windows shorter than this are not analyzed
pub const DEFAULT_MIN_FRAGMENT_SIZE: usize = 50;
/// Knotted probability above which a fragment is called knotted
pub const DEFAULT_KNOT_THRESHOLD: f64 = 0.50;
/// Knotted probability below which a single-shot result is confidently unknotted
pub const DEFAULT_AMBIGUITY_FLOOR: f64 = 0.20;
/// Minimum mean pLDDT for a structure to be considered reliable
pub const DEFAULT_MIN_QUALITY: f64 = 70.0;

pub const DEFAULT_ENDPOINT: &str = "https://api.esmatlas.com/foldSequence/v1/pdb/";
/// Longest sequence the public folding endpoint accepts
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 2000;

pub const DEFAULT_CLOSURE_SCHEME: u8 = 2;
pub const DEFAULT_SAMPLE_COUNT: u32 = 1000;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Window step must be positive (window size {window_size}, overlap {overlap})")]
    NonPositiveStep { window_size: usize, overlap: usize },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Complete configuration for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub prediction: PredictionConfig,
    pub topology: TopologyConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ReadError` or `ConfigurationError::ParseError`
    /// if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ParseError` if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.pipeline.validate()?;
        self.prediction.validate()?;
        self.topology.validate()?;

        if self.pipeline.window_size > self.prediction.max_sequence_length {
            tracing::warn!(
                "Window size {} exceeds the prediction service limit of {} residues",
                self.pipeline.window_size,
                self.prediction.max_sequence_length
            );
        }

        Ok(())
    }
}

/// Windowing, decision thresholds and dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub single_shot_limit: usize,
    pub window_size: usize,
    pub overlap: usize,
    pub min_fragment_size: usize,
    pub knot_threshold: f64,
    pub ambiguity_floor: f64,
    pub min_quality: f64,
    /// Quality reported for structures without any readable confidence values
    pub empty_confidence_default: f64,
    /// Maximum number of fragments analyzed at the same time
    pub concurrency: usize,
    /// Directory receiving one PDB file per analyzed fragment
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            single_shot_limit: DEFAULT_SINGLE_SHOT_LIMIT,
            window_size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_OVERLAP,
            min_fragment_size: DEFAULT_MIN_FRAGMENT_SIZE,
            knot_threshold: DEFAULT_KNOT_THRESHOLD,
            ambiguity_floor: DEFAULT_AMBIGUITY_FLOOR,
            min_quality: DEFAULT_MIN_QUALITY,
            empty_confidence_default: 0.0,
            concurrency: 1,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Check windowing and threshold parameters
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NonPositiveStep` if `overlap >= window_size`,
    /// or `ConfigurationError::Invalid` for any other out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.window_size <= self.overlap {
            return Err(ConfigurationError::NonPositiveStep {
                window_size: self.window_size,
                overlap: self.overlap,
            });
        }
        if self.min_fragment_size > self.window_size {
            return Err(ConfigurationError::Invalid(format!(
                "minimum fragment size {} exceeds window size {}",
                self.min_fragment_size, self.window_size
            )));
        }
        if self.single_shot_limit == 0 {
            return Err(ConfigurationError::Invalid(
                "single-shot limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.knot_threshold) {
            return Err(ConfigurationError::Invalid(format!(
                "knot threshold {} is outside [0, 1]",
                self.knot_threshold
            )));
        }
        if !(0.0..=self.knot_threshold).contains(&self.ambiguity_floor) {
            return Err(ConfigurationError::Invalid(format!(
                "ambiguity floor {} must be within [0, knot threshold {}]",
                self.ambiguity_floor, self.knot_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.min_quality) {
            return Err(ConfigurationError::Invalid(format!(
                "minimum quality {} is outside [0, 100]",
                self.min_quality
            )));
        }
        if !(0.0..=100.0).contains(&self.empty_confidence_default) {
            return Err(ConfigurationError::Invalid(format!(
                "empty confidence default {} is outside [0, 100]",
                self.empty_confidence_default
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigurationError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the structure prediction service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_sequence_length: usize,
    /// Additional attempts after a retryable failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further attempt
    pub initial_backoff_ms: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 300,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            max_retries: 2,
            initial_backoff_ms: 2000,
        }
    }
}

impl PredictionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` for an empty endpoint, zero timeout
    /// or zero length limit.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "prediction endpoint is empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "prediction timeout must be at least 1 second".to_string(),
            ));
        }
        if self.max_sequence_length == 0 {
            return Err(ConfigurationError::Invalid(
                "maximum sequence length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Knot invariants available from the topology library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    #[default]
    Alexander,
    Jones,
    Conway,
    Homfly,
}

impl Invariant {
    /// Name of the corresponding function in the topology library
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Alexander => "alexander",
            Self::Jones => "jones",
            Self::Conway => "conway",
            Self::Homfly => "homfly",
        }
    }
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.function_name())
    }
}

/// Settings for the stochastic knot invariant computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub invariant: Invariant,
    pub closure_scheme: u8,
    pub sample_count: u32,
    /// Python interpreter with the topology library installed
    pub python: PathBuf,
    pub timeout_secs: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            invariant: Invariant::default(),
            closure_scheme: DEFAULT_CLOSURE_SCHEME,
            sample_count: DEFAULT_SAMPLE_COUNT,
            python: PathBuf::from("python3"),
            timeout_secs: 600,
        }
    }
}

impl TopologyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` for a zero sample count or timeout.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sample_count == 0 {
            return Err(ConfigurationError::Invalid(
                "sample count must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "topology timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}
