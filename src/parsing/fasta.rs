//! Reader for protein sequence input.
//!
//! Accepts either FASTA (first record is used) or a bare sequence, from a
//! file, a gzip/bgzip compressed file, or stdin (`-`).
//!
//! Supported extensions for compressed input: `.gz`, `.bgz`

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::core::sequence::{Sequence, SequenceError};

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read a protein sequence from a path, or from stdin when the path is `-`.
///
/// # Errors
///
/// Returns `SequenceError::Io` if the input cannot be read,
/// `SequenceError::InvalidFasta` if FASTA input is malformed or has no records,
/// or `SequenceError::Empty` if no standard residues remain.
pub fn read_sequence(path: &Path) -> Result<Sequence, SequenceError> {
    let mut text = String::new();

    if path.to_string_lossy() == "-" {
        std::io::stdin().read_to_string(&mut text)?;
    } else if is_gzipped(path) {
        let file = std::fs::File::open(path)?;
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        text = std::fs::read_to_string(path)?;
    }

    parse_sequence_text(&text)
}

/// Parse FASTA or bare sequence text.
///
/// # Errors
///
/// See [`read_sequence`].
pub fn parse_sequence_text(text: &str) -> Result<Sequence, SequenceError> {
    if text.trim_start().starts_with('>') {
        let reader = BufReader::new(text.trim_start().as_bytes());
        parse_fasta_reader(&mut fasta::io::Reader::new(reader))
    } else {
        Sequence::sanitize(text)
    }
}

/// Take the first record from a noodles FASTA reader
fn parse_fasta_reader<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Sequence, SequenceError> {
    let mut records = reader.records();

    let record = records
        .next()
        .ok_or_else(|| SequenceError::InvalidFasta("No records found".to_string()))?
        .map_err(|e| SequenceError::InvalidFasta(format!("Failed to parse FASTA record: {e}")))?;

    let name = String::from_utf8_lossy(record.name()).to_string();
    let residues = String::from_utf8_lossy(record.sequence().as_ref()).to_string();

    let remaining = records.count();
    if remaining > 0 {
        tracing::warn!("Input has {} FASTA records; analyzing only '{name}'", remaining + 1);
    }

    tracing::debug!("Read FASTA record '{name}' ({} residues)", residues.len());
    Sequence::sanitize(&residues)
}
