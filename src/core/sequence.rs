use thiserror::Error;

/// The 20 standard amino-acid one-letter codes
pub const STANDARD_RESIDUES: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Sequence is empty after removing non-standard residues")]
    Empty,

    #[error("Failed to read sequence input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FASTA input: {0}")]
    InvalidFasta(String),
}

/// A protein sequence restricted to the standard amino-acid codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    residues: String,
    /// Characters removed during sanitization (excluding whitespace)
    dropped: usize,
}

impl Sequence {
    /// Build a sequence from raw user input.
    ///
    /// Input is uppercased, whitespace is removed, and any character that is not
    /// one of the 20 standard amino-acid codes is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Empty` if nothing remains after sanitization.
    pub fn sanitize(raw: &str) -> Result<Self, SequenceError> {
        let mut residues = String::with_capacity(raw.len());
        let mut dropped = 0;

        for c in raw.chars().filter(|c| !c.is_whitespace()) {
            let upper = c.to_ascii_uppercase();
            if upper.is_ascii() && STANDARD_RESIDUES.contains(&(upper as u8)) {
                residues.push(upper);
            } else {
                dropped += 1;
            }
        }

        if residues.is_empty() {
            return Err(SequenceError::Empty);
        }

        if dropped > 0 {
            tracing::warn!("Removed {dropped} non-standard characters from input sequence");
        }

        Ok(Self { residues, dropped })
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.residues
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Lowercase hex MD5 of the sanitized residues
    #[must_use]
    pub fn md5(&self) -> String {
        format!("{:x}", md5::compute(self.residues.as_bytes()))
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.residues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_uppercases_and_strips_whitespace() {
        let seq = Sequence::sanitize("mkt ayi\nakq\r\n").unwrap();
        assert_eq!(seq.as_str(), "MKTAYIAKQ");
        assert_eq!(seq.len(), 9);
        assert_eq!(seq.dropped(), 0);
    }

    #[test]
    fn test_sanitize_drops_nonstandard_codes() {
        // B, X, Z, digits and '*' are not standard residues
        let seq = Sequence::sanitize("MKBXZ12*A").unwrap();
        assert_eq!(seq.as_str(), "MKA");
        assert_eq!(seq.dropped(), 6);
    }

    #[test]
    fn test_sanitize_empty() {
        assert!(matches!(Sequence::sanitize(""), Err(SequenceError::Empty)));
        assert!(matches!(
            Sequence::sanitize("  \n123 "),
            Err(SequenceError::Empty)
        ));
    }

    #[test]
    fn test_md5_of_sanitized_residues() {
        let a = Sequence::sanitize("acgt").unwrap();
        let b = Sequence::sanitize("ACGT").unwrap();
        assert_eq!(a.md5(), b.md5());
        assert_eq!(a.md5().len(), 32);
    }
}
