use std::path::PathBuf;

use clap::Args;

use crate::analysis::fragment::{FragmentResult, StructureEvaluator};
use crate::cli::OutputFormat;
use crate::config::{Config, Invariant};
use crate::core::range::ResidueRange;
use crate::parsing::pdb::StructureModel;
use crate::topology::topoly::TopolyCommand;

#[derive(Args)]
pub struct InspectArgs {
    /// PDB structure to assess and classify
    #[arg(required = true)]
    pub structure: PathBuf,

    /// JSON configuration file; command-line options take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Knotted probability above which the structure is knotted (default 0.5)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Mean pLDDT below which the structure is flagged unreliable (default 70)
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Knot invariant used for classification
    #[arg(long, value_enum)]
    pub invariant: Option<Invariant>,

    /// Chain closure method (default 2)
    #[arg(long)]
    pub closure: Option<u8>,

    /// Number of random closures sampled (default 1000)
    #[arg(long)]
    pub tries: Option<u32>,

    /// Python interpreter with Topoly installed
    #[arg(long)]
    pub python: Option<PathBuf>,
}

/// Execute inspect subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the structure cannot be
/// read. A failed topology computation is reported as indeterminate.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: InspectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(threshold) = args.threshold {
        config.pipeline.knot_threshold = threshold;
    }
    if let Some(min_quality) = args.min_quality {
        config.pipeline.min_quality = min_quality;
    }
    if let Some(invariant) = args.invariant {
        config.topology.invariant = invariant;
    }
    if let Some(closure) = args.closure {
        config.topology.closure_scheme = closure;
    }
    if let Some(tries) = args.tries {
        config.topology.sample_count = tries;
    }
    if let Some(python) = args.python.clone() {
        config.topology.python = python;
    }
    config.validate()?;

    let structure = StructureModel::load(&args.structure)?;
    let residues = structure.residue_count();
    if residues == 0 {
        anyhow::bail!(
            "{} has no alpha-carbon records to classify",
            args.structure.display()
        );
    }

    if verbose {
        eprintln!(
            "Loaded {} atoms over {residues} residues from {}",
            structure.atom_records(),
            args.structure.display()
        );
    }

    let evaluator = StructureEvaluator::new(
        Box::new(TopolyCommand::new(config.topology.clone())),
        &config.pipeline,
        &config.topology,
    );
    let result = evaluator.evaluate(
        ResidueRange::new(0, residues),
        &structure,
        config.pipeline.knot_threshold,
    );

    match format {
        OutputFormat::Text => print_text_results(&result, config.pipeline.knot_threshold),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Tsv => print_tsv_results(&result),
    }

    Ok(())
}

fn print_text_results(result: &FragmentResult, threshold: f64) {
    if let Some(path) = &result.structure_path {
        println!("Structure: {}", path.display());
    }
    println!("Residues: {}", result.range.len());
    println!(
        "Quality (pLDDT): {} ({})",
        result.quality, result.quality_status
    );

    if result.indeterminate {
        println!("Topology: could not be computed");
        return;
    }

    println!(
        "Topology: {} (knotted probability {:.1}%, threshold {:.1}%)",
        result.verdict.dominant_type,
        result.verdict.knotted_probability * 100.0,
        threshold * 100.0
    );
    println!(
        "Unknot probability: {:.1}%",
        result.verdict.unknotted_probability() * 100.0
    );
    println!("Knotted: {}", if result.is_knotted { "yes" } else { "no" });

    if !result.verdict.distribution.is_empty() {
        println!("\nDistribution:");
        for (label, probability) in &result.verdict.distribution {
            println!("   {label}: {probability:.3}");
        }
    }
}

fn print_tsv_results(result: &FragmentResult) {
    println!("residues\tdominant_type\tknotted_probability\tquality\tquality_status\tis_knotted\tindeterminate");
    println!(
        "{}\t{}\t{:.4}\t{:.1}\t{}\t{}\t{}",
        result.range.len(),
        result.verdict.dominant_type,
        result.verdict.knotted_probability,
        result.quality.value(),
        result.quality_status,
        result.is_knotted,
        result.indeterminate,
    );
}
