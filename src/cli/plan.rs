use std::path::PathBuf;

use clap::Args;

use crate::analysis::window::WindowPlanner;
use crate::cli::{OutputFormat, SequenceInput};
use crate::config::{Config, PipelineConfig};
use crate::core::range::ResidueRange;
use crate::core::types::AnalysisMode;

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: SequenceInput,

    /// Plan for a sequence of this many residues instead of reading one
    #[arg(short, long, conflicts_with_all = ["input", "sequence"])]
    pub length: Option<usize>,

    /// JSON configuration file; command-line options take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Longest sequence analyzed as a single fragment (default 400)
    #[arg(long)]
    pub single_shot_limit: Option<usize>,

    /// Window length in residues (default 400)
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Residues shared by consecutive windows (default 200)
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Shortest trailing window that is still analyzed (default 50)
    #[arg(long)]
    pub min_fragment_size: Option<usize>,
}

/// Execute plan subcommand
///
/// # Errors
///
/// Returns an error if the windowing configuration is invalid or the sequence
/// cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: PlanArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut pipeline = match &args.config {
        Some(path) => Config::load_from_file(path)?.pipeline,
        None => PipelineConfig::default(),
    };
    if let Some(limit) = args.single_shot_limit {
        pipeline.single_shot_limit = limit;
    }
    if let Some(window_size) = args.window_size {
        pipeline.window_size = window_size;
    }
    if let Some(overlap) = args.overlap {
        pipeline.overlap = overlap;
    }
    if let Some(min_fragment_size) = args.min_fragment_size {
        pipeline.min_fragment_size = min_fragment_size;
    }
    pipeline.validate()?;

    let length = match args.length {
        Some(length) => length,
        None if args.input.is_given() => args.input.load(verbose)?.len(),
        None => anyhow::bail!("Provide an input file, --sequence or --length"),
    };
    if length == 0 {
        anyhow::bail!("Sequence length must be at least 1");
    }

    let (mode, ranges) = if length > pipeline.single_shot_limit {
        let planner = WindowPlanner::new(
            pipeline.window_size,
            pipeline.overlap,
            pipeline.min_fragment_size,
        )?;
        (AnalysisMode::Windowed, planner.plan(length).collect())
    } else {
        (AnalysisMode::Direct, vec![ResidueRange::new(0, length)])
    };

    match format {
        OutputFormat::Text => print_text_results(length, mode, &ranges),
        OutputFormat::Json => print_json_results(length, mode, &ranges)?,
        OutputFormat::Tsv => print_tsv_results(&ranges),
    }

    Ok(())
}

fn print_text_results(length: usize, mode: AnalysisMode, ranges: &[ResidueRange]) {
    println!("Sequence length: {length}");
    println!("Mode: {mode} ({} fragments)", ranges.len());
    println!();
    for (i, range) in ranges.iter().enumerate() {
        println!(
            "   #{} residues {} ({} aa) -> {}.pdb",
            i + 1,
            range,
            range.len(),
            range.fragment_id()
        );
    }
}

fn print_json_results(
    length: usize,
    mode: AnalysisMode,
    ranges: &[ResidueRange],
) -> anyhow::Result<()> {
    let fragments: Vec<_> = ranges
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.fragment_id(),
                "first_residue": r.first_residue(),
                "last_residue": r.last_residue(),
                "length": r.len(),
            })
        })
        .collect();

    let output = serde_json::json!({
        "sequence_length": length,
        "mode": mode,
        "fragments": fragments,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(ranges: &[ResidueRange]) {
    println!("id\tfirst_residue\tlast_residue\tlength");
    for range in ranges {
        println!(
            "{}\t{}\t{}\t{}",
            range.fragment_id(),
            range.first_residue(),
            range.last_residue(),
            range.len()
        );
    }
}
