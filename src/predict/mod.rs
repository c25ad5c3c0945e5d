//! Structure prediction collaborators.
//!
//! The pipeline only needs one capability from a structure predictor: turn a
//! plain amino-acid sequence into a PDB document. [`StructurePredictor`] is that
//! seam; [`esmfold::EsmFoldClient`] implements it against the public ESM Atlas
//! folding endpoint.
//!
//! ## Failure classes
//!
//! | Error | Meaning | Retried |
//! |-------|---------|---------|
//! | `PayloadTooLarge` | Sequence exceeds the service limit (HTTP 413 or local check) | No |
//! | `Status` | Non-success HTTP status | Only 429 and 5xx |
//! | `Transport` | Connection, TLS or timeout failure | Yes |

use thiserror::Error;

pub mod esmfold;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Sequence of {length} residues is too large for the prediction service")]
    PayloadTooLarge { length: usize },

    #[error("Prediction service returned status {status}")]
    Status { status: u16, body: String },

    #[error("Connection to prediction service failed: {0}")]
    Transport(String),

    #[error("Failed to build prediction client: {0}")]
    Client(String),
}

impl PredictionError {
    /// Whether a later attempt might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::PayloadTooLarge { .. } | Self::Client(_) => false,
        }
    }
}

/// A service that predicts the 3-D structure of a protein sequence
pub trait StructurePredictor: Send + Sync {
    /// Predict the structure of `sequence` and return the PDB document text.
    ///
    /// # Errors
    ///
    /// Returns a `PredictionError` when the service cannot produce a structure.
    fn predict(&self, sequence: &str) -> Result<String, PredictionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |status| PredictionError::Status {
            status,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!PredictionError::PayloadTooLarge { length: 5000 }.is_retryable());
        assert!(PredictionError::Transport("reset".into()).is_retryable());
    }
}
