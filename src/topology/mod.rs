//! Knot classification of predicted structures.
//!
//! The stochastic invariant itself (random chain closures followed by a knot
//! polynomial) is computed by an external library behind the [`KnotInvariant`]
//! trait. [`TopologyClassifier`] turns the distribution it returns into a
//! [`TopologyVerdict`]:
//!
//! - `knotted_probability = 1 - P(0_1)`
//! - `dominant_type` is the most probable label
//! - an empty distribution means "no knot found" and yields the unknot verdict
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use knot_detector::topology::TopologyVerdict;
//!
//! let dist = BTreeMap::from([("0_1".to_string(), 0.7), ("3_1".to_string(), 0.3)]);
//! let verdict = TopologyVerdict::from_distribution(dist).unwrap();
//! assert_eq!(verdict.dominant_type.0, "0_1");
//! assert!((verdict.knotted_probability - 0.3).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::KnotType;
use crate::parsing::pdb::StructureModel;

pub mod topoly;

/// Probability of each knot type label over all sampled closures
pub type Distribution = BTreeMap<String, f64>;

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Knot invariant computation failed: {0}")]
    Invariant(String),

    #[error("Invalid probability {probability} for knot type '{label}'")]
    InvalidDistribution { label: String, probability: f64 },

    #[error("Structure has not been written to disk")]
    NotPersisted,
}

/// A stochastic knot invariant over a 3-D structure
pub trait KnotInvariant: Send + Sync {
    /// Compute the knot type distribution of `structure` from `sample_count`
    /// random closures of kind `closure_scheme`.
    ///
    /// # Errors
    ///
    /// Returns `ClassificationError::Invariant` if the computation fails.
    fn distribution(
        &self,
        structure: &StructureModel,
        closure_scheme: u8,
        sample_count: u32,
    ) -> Result<Distribution, ClassificationError>;
}

/// Summary of a knot type distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyVerdict {
    pub dominant_type: KnotType,
    pub knotted_probability: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub distribution: Distribution,
}

impl TopologyVerdict {
    /// Verdict used when no knot could be found or the computation failed
    pub fn unknotted() -> Self {
        Self {
            dominant_type: KnotType::unknot(),
            knotted_probability: 0.0,
            distribution: Distribution::new(),
        }
    }

    /// Summarize a distribution.
    ///
    /// # Errors
    ///
    /// Returns `ClassificationError::InvalidDistribution` if any probability is
    /// negative or not finite.
    pub fn from_distribution(distribution: Distribution) -> Result<Self, ClassificationError> {
        if let Some((label, &probability)) = distribution
            .iter()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(ClassificationError::InvalidDistribution {
                label: label.clone(),
                probability,
            });
        }

        // Ties go to the first label in key order
        let Some((dominant, _)) = distribution
            .iter()
            .fold(None, |best: Option<(&String, f64)>, (label, &p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((label, p)),
            })
        else {
            return Ok(Self::unknotted());
        };

        let unknotted = distribution.get(KnotType::UNKNOT).copied().unwrap_or(0.0);

        Ok(Self {
            dominant_type: KnotType::new(dominant.clone()),
            knotted_probability: (1.0 - unknotted).clamp(0.0, 1.0),
            distribution,
        })
    }

    /// Probability that the chain is the trivial knot
    pub fn unknotted_probability(&self) -> f64 {
        1.0 - self.knotted_probability
    }
}

/// Adapter from a [`KnotInvariant`] to verdicts
pub struct TopologyClassifier {
    invariant: Box<dyn KnotInvariant>,
}

impl TopologyClassifier {
    pub fn new(invariant: Box<dyn KnotInvariant>) -> Self {
        Self { invariant }
    }

    /// Classify the topology of `structure`.
    ///
    /// # Errors
    ///
    /// Returns a `ClassificationError` if the invariant computation fails or
    /// returns an invalid distribution. Callers treat this as an indeterminate
    /// fragment rather than aborting the run.
    pub fn classify(
        &self,
        structure: &StructureModel,
        closure_scheme: u8,
        sample_count: u32,
    ) -> Result<TopologyVerdict, ClassificationError> {
        let distribution = self
            .invariant
            .distribution(structure, closure_scheme, sample_count)?;

        if distribution.is_empty() {
            tracing::debug!("Empty knot distribution, treating structure as unknotted");
        }

        TopologyVerdict::from_distribution(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDB: &str =
        "ATOM      1  CA  MET A   1      -8.608   3.135  -1.618  1.00 88.50           C\n";

    struct Fixed(Result<Distribution, String>);

    impl KnotInvariant for Fixed {
        fn distribution(
            &self,
            _structure: &StructureModel,
            _closure_scheme: u8,
            _sample_count: u32,
        ) -> Result<Distribution, ClassificationError> {
            self.0.clone().map_err(ClassificationError::Invariant)
        }
    }

    fn dist(entries: &[(&str, f64)]) -> Distribution {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_mostly_unknotted() {
        let verdict = TopologyVerdict::from_distribution(dist(&[("0_1", 0.7), ("3_1", 0.3)]))
            .unwrap();
        assert_eq!(verdict.dominant_type, KnotType::new("0_1"));
        assert!((verdict.knotted_probability - 0.3).abs() < 1e-9);
        assert!((verdict.unknotted_probability() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_trefoil_dominant() {
        let verdict =
            TopologyVerdict::from_distribution(dist(&[("0_1", 0.1), ("3_1", 0.85), ("4_1", 0.05)]))
                .unwrap();
        assert_eq!(verdict.dominant_type, KnotType::new("3_1"));
        assert!((verdict.knotted_probability - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_unknot_label_is_fully_knotted() {
        let verdict = TopologyVerdict::from_distribution(dist(&[("3_1", 1.0)])).unwrap();
        assert!((verdict.knotted_probability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_distribution_defaults_to_unknot() {
        let verdict = TopologyVerdict::from_distribution(Distribution::new()).unwrap();
        assert_eq!(verdict, TopologyVerdict::unknotted());
        assert!(verdict.knotted_probability.abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_resolved_by_label_order() {
        let verdict = TopologyVerdict::from_distribution(dist(&[("3_1", 0.5), ("0_1", 0.5)]))
            .unwrap();
        assert_eq!(verdict.dominant_type, KnotType::new("0_1"));
    }

    #[test]
    fn test_invalid_probabilities_rejected() {
        let negative = TopologyVerdict::from_distribution(dist(&[("0_1", 1.2), ("3_1", -0.2)]));
        assert!(matches!(
            negative,
            Err(ClassificationError::InvalidDistribution { .. })
        ));

        let nan = TopologyVerdict::from_distribution(dist(&[("0_1", f64::NAN)]));
        assert!(nan.is_err());
    }

    #[test]
    fn test_classifier_propagates_invariant_failure() {
        let structure = StructureModel::parse(PDB).unwrap();
        let classifier = TopologyClassifier::new(Box::new(Fixed(Err("boom".to_string()))));
        let result = classifier.classify(&structure, 2, 100);
        assert!(matches!(result, Err(ClassificationError::Invariant(_))));
    }

    #[test]
    fn test_classifier_summarizes_distribution() {
        let structure = StructureModel::parse(PDB).unwrap();
        let classifier =
            TopologyClassifier::new(Box::new(Fixed(Ok(dist(&[("0_1", 0.2), ("3_1", 0.8)])))));
        let verdict = classifier.classify(&structure, 2, 100).unwrap();
        assert_eq!(verdict.dominant_type, KnotType::new("3_1"));
        assert!((verdict.knotted_probability - 0.8).abs() < 1e-9);
    }
}
