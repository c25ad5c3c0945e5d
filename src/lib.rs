//! # knot-detector
//!
//! A library for detecting knots in proteins from their amino-acid sequence alone.
//!
//! A sequence is folded by a structure prediction service, the predicted
//! structure is scored for reliability from its per-residue confidence (pLDDT),
//! and its backbone is classified with a knot invariant. Sequences too long to
//! predict in one piece are split into overlapping windows that are analyzed
//! independently; any knotted window makes the sequence knotted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knot_detector::analysis::fragment::FragmentAnalyzer;
//! use knot_detector::analysis::pipeline::Pipeline;
//! use knot_detector::config::Config;
//! use knot_detector::parsing::fasta::parse_sequence_text;
//! use knot_detector::predict::esmfold::EsmFoldClient;
//! use knot_detector::topology::topoly::TopolyCommand;
//!
//! let config = Config::default();
//! let sequence = parse_sequence_text(">query\nMKTAYIAKQRQISFVKSHFSRQ\n").unwrap();
//!
//! let analyzer = FragmentAnalyzer::from_config(
//!     Box::new(EsmFoldClient::new(config.prediction.clone()).unwrap()),
//!     Box::new(TopolyCommand::new(config.topology.clone())),
//!     &config.pipeline,
//!     &config.topology,
//! );
//! let report = Pipeline::new(config.pipeline.clone(), analyzer)
//!     .run(&sequence)
//!     .unwrap();
//!
//! println!("{} ({} fragments)", report.conclusion, report.attempted_count);
//! ```
//!
//! ## Modules
//!
//! - [`analysis`]: Windowing, quality assessment, fragment analysis and the pipeline
//! - [`config`]: Run configuration and validation
//! - [`core`]: Sequences, residue ranges and shared types
//! - [`parsing`]: FASTA input and PDB structure parsing
//! - [`predict`]: Structure prediction clients
//! - [`topology`]: Knot classification
//! - [`cli`]: Command-line interface implementation

pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod parsing;
pub mod predict;
pub mod topology;

// Re-export commonly used types for convenience
pub use analysis::fragment::{FragmentAnalyzer, FragmentResult};
pub use analysis::pipeline::{Pipeline, PipelineReport};
pub use config::Config;
pub use core::sequence::Sequence;
pub use core::types::*;
