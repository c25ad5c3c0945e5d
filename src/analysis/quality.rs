use serde::{Deserialize, Serialize};

use crate::parsing::pdb::StructureModel;

/// Mean per-residue confidence on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityScore(f64);

impl QualityScore {
    /// Clamp `value` into `[0, 100]`
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 100.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for QualityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Reduces per-atom pLDDT values to a single reliability score
#[derive(Debug, Clone, Copy)]
pub struct QualityAssessor {
    /// Score returned when a structure carries no readable confidence values
    empty_default: f64,
}

impl QualityAssessor {
    pub fn new(empty_default: f64) -> Self {
        Self { empty_default }
    }

    /// Mean confidence of all atom records.
    ///
    /// Some predictors write pLDDT normalized to `[0, 1]`; a raw mean at or
    /// below 1.0 is taken as normalized and scaled by 100.
    pub fn assess(&self, structure: &StructureModel) -> QualityScore {
        let (sum, count) = structure
            .confidence_values()
            .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));

        if count == 0 {
            tracing::warn!(
                "No confidence values found, using default quality {:.1}",
                self.empty_default
            );
            return QualityScore::new(self.empty_default);
        }

        #[allow(clippy::cast_precision_loss)] // Atom counts are far below 2^52
        let mean = sum / count as f64;

        if mean <= 1.0 {
            QualityScore::new(mean * 100.0)
        } else {
            QualityScore::new(mean)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(serial: usize, confidence: &str) -> String {
        format!(
            "ATOM  {serial:>5}  CA  MET A{serial:>4}      -8.608   3.135  -1.618  1.00{confidence:>6}           C\n"
        )
    }

    fn structure(confidences: &[&str]) -> StructureModel {
        let text: String = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| atom(i + 1, c))
            .collect();
        StructureModel::parse(text).unwrap()
    }

    #[test]
    fn test_fixture_column_alignment() {
        assert_eq!(&atom(1, "87.31")[60..66], " 87.31");
    }

    #[test]
    fn test_percent_scale_unchanged() {
        let score = QualityAssessor::new(0.0).assess(&structure(&["80.00", "90.00", "70.00"]));
        assert!((score.value() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_scale_rescaled() {
        let score = QualityAssessor::new(0.0).assess(&structure(&["0.80", "0.90", "0.70"]));
        assert!((score.value() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_values_ignored() {
        let score = QualityAssessor::new(0.0).assess(&structure(&["90.00", "n/a", "70.00"]));
        assert!((score.value() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_confidence_uses_default() {
        let assessor = QualityAssessor::new(100.0);
        let score = assessor.assess(&structure(&["", "--"]));
        assert!((score.value() - 100.0).abs() < f64::EPSILON);

        let score = QualityAssessor::new(0.0).assess(&structure(&[""]));
        assert!(score.value().abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_clamped() {
        assert!((QualityScore::new(140.0).value() - 100.0).abs() < f64::EPSILON);
        assert!(QualityScore::new(-3.0).value().abs() < f64::EPSILON);
    }
}
