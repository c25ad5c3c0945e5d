//! Command-line interface for knot-detector.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **analyze**: Predict structures for a sequence and test them for knots
//! - **inspect**: Assess and classify an existing PDB structure
//! - **plan**: Show the fragments a sequence would be split into
//!
//! ## Usage
//!
//! ```text
//! # Analyze a protein from a FASTA file
//! knot-detector analyze protein.fasta
//!
//! # Analyze a raw sequence, four fragments at a time, JSON output
//! knot-detector analyze --sequence MKTAYIAKQR... -j 4 --format json
//!
//! # Re-classify a structure saved by an earlier run
//! knot-detector inspect fragment_201_600.pdb
//!
//! # Preview the sliding windows for a 1200-residue protein
//! knot-detector plan --length 1200
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::sequence::Sequence;
use crate::parsing::fasta;

pub mod analyze;
pub mod inspect;
pub mod plan;

#[derive(Parser)]
#[command(name = "knot-detector")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Detect knots in proteins from their amino-acid sequence")]
#[command(
    long_about = "knot-detector predicts the 3D structure of a protein with ESMFold and classifies its topology with Topoly.\n\nSequences longer than the single-shot limit are split into overlapping windows that are analyzed independently. It reports:\n- Whether the protein is knotted, unknotted or ambiguous\n- The dominant knot type and knotted probability of each knotted fragment\n- The reliability (mean pLDDT) of every predicted structure"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect knots in a protein sequence
    Analyze(analyze::AnalyzeArgs),

    /// Assess and classify an existing structure file
    Inspect(inspect::InspectArgs),

    /// Show how a sequence would be split into fragments
    Plan(plan::PlanArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where the protein sequence comes from
#[derive(clap::Args, Debug)]
pub struct SequenceInput {
    /// FASTA or raw sequence file (optionally gzipped). Use '-' for stdin
    #[arg(conflicts_with = "sequence")]
    pub input: Option<PathBuf>,

    /// Sequence given directly on the command line
    #[arg(short, long)]
    pub sequence: Option<String>,
}

impl SequenceInput {
    pub fn is_given(&self) -> bool {
        self.input.is_some() || self.sequence.is_some()
    }

    /// Read and sanitize the sequence
    ///
    /// # Errors
    ///
    /// Returns an error if no input was given, the input cannot be read, or no
    /// standard residue remains after sanitization.
    pub fn load(&self, verbose: bool) -> anyhow::Result<Sequence> {
        let sequence = match (&self.input, &self.sequence) {
            (_, Some(raw)) => fasta::parse_sequence_text(raw)?,
            (Some(path), None) => fasta::read_sequence(path)?,
            (None, None) => anyhow::bail!("Provide an input file or --sequence"),
        };

        if verbose {
            eprintln!(
                "Read sequence of {} residues (md5 {})",
                sequence.len(),
                sequence.md5()
            );
        }

        Ok(sequence)
    }
}
