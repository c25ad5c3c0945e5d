//! Minimal reader for predicted structures in PDB format.
//!
//! Only what the pipeline needs is extracted: the number of `ATOM` records and
//! the per-atom confidence (pLDDT) that structure predictors write into the
//! B-factor column.
//!
//! ```text
//! ATOM      1  N   MET A   1      -8.901   4.127  -0.555  1.00 87.31           N
//!                                                              ^^^^^^
//!                                                              columns 61-66
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Byte columns (0-based, half-open) holding the B-factor / pLDDT value
pub const CONFIDENCE_COLUMNS: std::ops::Range<usize> = 60..66;
const ATOM_NAME_COLUMNS: std::ops::Range<usize> = 12..16;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Structure contains no ATOM records")]
    NoAtomRecords,
}

/// A predicted 3-D structure, owned by the fragment analysis that produced it
#[derive(Debug, Clone)]
pub struct StructureModel {
    text: String,
    atom_records: usize,
    path: Option<PathBuf>,
}

impl StructureModel {
    /// Parse a PDB document held in memory.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::NoAtomRecords` if the document has no `ATOM` lines,
    /// which is how error pages and truncated responses present.
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseError> {
        let text = text.into();
        let atom_records = text.lines().filter(|l| is_atom_record(l)).count();

        if atom_records == 0 {
            return Err(ParseError::NoAtomRecords);
        }

        Ok(Self {
            text,
            atom_records,
            path: None,
        })
    }

    /// Read and parse a PDB file from disk
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, or
    /// `ParseError::NoAtomRecords` if it contains no atoms.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(text)?.with_path(path))
    }

    /// Record where this structure has been persisted
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn atom_records(&self) -> usize {
        self.atom_records
    }

    /// Number of residues, counted by their alpha-carbon records
    pub fn residue_count(&self) -> usize {
        self.text
            .lines()
            .filter(|l| is_atom_record(l))
            .filter(|l| l.get(ATOM_NAME_COLUMNS).is_some_and(|name| name.trim() == "CA"))
            .count()
    }

    /// Confidence values of every `ATOM` record.
    ///
    /// Records whose confidence field is missing or unparseable are skipped.
    pub fn confidence_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.text
            .lines()
            .filter(|l| is_atom_record(l))
            .filter_map(parse_confidence)
    }
}

fn is_atom_record(line: &str) -> bool {
    line.starts_with("ATOM")
}

fn parse_confidence(line: &str) -> Option<f64> {
    line.get(CONFIDENCE_COLUMNS)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
