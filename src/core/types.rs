use serde::{Deserialize, Serialize};

/// Knot type label as reported by the invariant library (e.g. `0_1`, `3_1`, `4_1`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnotType(pub String);

impl KnotType {
    /// Label of the trivial knot
    pub const UNKNOT: &'static str = "0_1";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn unknot() -> Self {
        Self(Self::UNKNOT.to_string())
    }

    #[must_use]
    pub fn is_unknot(&self) -> bool {
        self.0 == Self::UNKNOT
    }
}

impl std::fmt::Display for KnotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a sequence was analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// The whole sequence was submitted in a single prediction
    Direct,
    /// The sequence was split into overlapping windows
    Windowed,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Windowed => write!(f, "sliding window"),
        }
    }
}

/// Overall verdict for a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Knotted,
    Unknotted,
    /// Neither confidently knotted nor confidently unknotted (direct mode only)
    Ambiguous,
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Knotted => write!(f, "KNOTTED"),
            Self::Unknotted => write!(f, "UNKNOTTED"),
            Self::Ambiguous => write!(f, "AMBIGUOUS"),
        }
    }
}

/// Reliability of a predicted structure relative to the pLDDT cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Pass,
    /// Low-confidence structures may yield false positives
    Unreliable,
}

impl QualityStatus {
    #[must_use]
    pub fn from_score(score: f64, cutoff: f64) -> Self {
        if score >= cutoff {
            Self::Pass
        } else {
            Self::Unreliable
        }
    }
}

impl std::fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Unreliable => write!(f, "UNRELIABLE"),
        }
    }
}
