//! Parsers for pipeline inputs and predicted structures.
//!
//! - **Sequence input** ([`fasta`]): FASTA or bare sequence text, optionally gzipped
//! - **Predicted structures** ([`pdb`]): PDB documents returned by the prediction service
//!
//! ## Example
//!
//! ```rust
//! use knot_detector::parsing::fasta::parse_sequence_text;
//!
//! let seq = parse_sequence_text(">query\nMKTAYIAKQR\n").unwrap();
//! assert_eq!(seq.len(), 10);
//! ```

pub mod fasta;
pub mod pdb;
