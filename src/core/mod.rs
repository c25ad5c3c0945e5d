//! Core data types for knot detection.
//!
//! - [`Sequence`](sequence::Sequence): a sanitized protein sequence
//! - [`ResidueRange`](range::ResidueRange), [`Fragment`](range::Fragment): windows over a sequence
//! - [`KnotType`](types::KnotType), [`Conclusion`](types::Conclusion),
//!   [`QualityStatus`](types::QualityStatus): result classification types
//!
//! ## Coordinates
//!
//! Ranges are stored 0-based and half-open (`[start, end)`) and displayed
//! 1-based and inclusive, matching how residues are numbered in structures:
//!
//! | Stored       | Displayed | Artifact              |
//! |--------------|-----------|-----------------------|
//! | `[0, 400)`   | 1-400     | `fragment_1_400.pdb`   |
//! | `[200, 600)` | 201-600   | `fragment_201_600.pdb` |

pub mod range;
pub mod sequence;
pub mod types;
