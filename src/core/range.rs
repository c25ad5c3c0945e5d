use serde::{Deserialize, Serialize};

use crate::core::sequence::Sequence;

/// Half-open interval `[start, end)` of 0-based residue indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResidueRange {
    pub start: usize,
    pub end: usize,
}

impl ResidueRange {
    /// Create a new range.
    ///
    /// # Panics
    ///
    /// Panics if the range would be empty (`end <= start`).
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end > start, "residue range must be non-empty: [{start}, {end})");
        Self { start, end }
    }

    #[allow(clippy::len_without_is_empty)] // Never empty by construction
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// First residue in 1-based, inclusive coordinates
    pub fn first_residue(&self) -> usize {
        self.start + 1
    }

    /// Last residue in 1-based, inclusive coordinates
    pub fn last_residue(&self) -> usize {
        self.end
    }

    /// Identifier used for fragment artifacts, e.g. `fragment_201_600`
    pub fn fragment_id(&self) -> String {
        format!("fragment_{}_{}", self.first_residue(), self.last_residue())
    }
}

/// Displays the range the way residues are numbered in biology: `201-600`
impl std::fmt::Display for ResidueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first_residue(), self.last_residue())
    }
}

/// A contiguous slice of the full sequence, analyzed independently
#[derive(Debug, Clone)]
pub struct Fragment {
    pub range: ResidueRange,
    pub residues: String,
}

impl Fragment {
    /// Slice `sequence` by `range`.
    ///
    /// Residues are ASCII after sanitization, so byte offsets equal residue offsets.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the end of the sequence.
    pub fn from_sequence(sequence: &Sequence, range: ResidueRange) -> Self {
        Self {
            range,
            residues: sequence.as_str()[range.start..range.end].to_string(),
        }
    }

    /// A fragment spanning the whole sequence
    pub fn whole(sequence: &Sequence) -> Self {
        Self::from_sequence(sequence, ResidueRange::new(0, sequence.len()))
    }

    pub fn id(&self) -> String {
        self.range.fragment_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_based_display() {
        let range = ResidueRange::new(200, 600);
        assert_eq!(range.len(), 400);
        assert_eq!(range.to_string(), "201-600");
        assert_eq!(range.fragment_id(), "fragment_201_600");
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_empty_range_rejected() {
        let _ = ResidueRange::new(5, 5);
    }

    #[test]
    fn test_fragment_slice() {
        let seq = Sequence::sanitize("MKTAYIAKQR").unwrap();
        let fragment = Fragment::from_sequence(&seq, ResidueRange::new(2, 6));
        assert_eq!(fragment.residues, "TAYI");
        assert_eq!(fragment.id(), "fragment_3_6");

        let whole = Fragment::whole(&seq);
        assert_eq!(whole.residues, "MKTAYIAKQR");
        assert_eq!(whole.range, ResidueRange::new(0, 10));
    }
}
