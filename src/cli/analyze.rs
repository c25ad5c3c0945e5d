use std::path::PathBuf;

use clap::Args;

use crate::analysis::fragment::{FragmentAnalyzer, FragmentResult};
use crate::analysis::pipeline::{Pipeline, PipelineReport};
use crate::cli::{OutputFormat, SequenceInput};
use crate::config::{Config, Invariant};
use crate::predict::esmfold::EsmFoldClient;
use crate::topology::topoly::TopolyCommand;

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: SequenceInput,

    /// JSON configuration file; command-line options take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory receiving one PDB file per analyzed fragment
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of fragments analyzed at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    // === Windowing options ===
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

    // === Decision options ===
    /// Knotted probability above which a fragment is knotted (default 0.5)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Knotted probability below which a single fragment is confidently unknotted (default 0.2)
    #[arg(long)]
    pub ambiguity_floor: Option<f64>,

    /// Mean pLDDT below which a structure is flagged unreliable (default 70)
    #[arg(long)]
    pub min_quality: Option<f64>,

    // === Prediction options ===
    /// Structure prediction endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Prediction request timeout in seconds (default 300)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after a transient prediction failure (default 2)
    #[arg(long)]
    pub retries: Option<u32>,

    // === Topology options ===
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

impl AnalyzeArgs {
    /// Defaults, then the configuration file, then command-line overrides
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };

        let pipeline = &mut config.pipeline;
        override_with(&mut pipeline.output_dir, self.output_dir.clone());
        override_with(&mut pipeline.concurrency, self.concurrency);
        override_with(&mut pipeline.single_shot_limit, self.single_shot_limit);
        override_with(&mut pipeline.window_size, self.window_size);
        override_with(&mut pipeline.overlap, self.overlap);
        override_with(&mut pipeline.min_fragment_size, self.min_fragment_size);
        override_with(&mut pipeline.knot_threshold, self.threshold);
        override_with(&mut pipeline.ambiguity_floor, self.ambiguity_floor);
        override_with(&mut pipeline.min_quality, self.min_quality);

        let prediction = &mut config.prediction;
        override_with(&mut prediction.endpoint, self.endpoint.clone());
        override_with(&mut prediction.timeout_secs, self.timeout);
        override_with(&mut prediction.max_retries, self.retries);

        let topology = &mut config.topology;
        override_with(&mut topology.invariant, self.invariant);
        override_with(&mut topology.closure_scheme, self.closure);
        override_with(&mut topology.sample_count, self.tries);
        override_with(&mut topology.python, self.python.clone());

        config.validate()?;
        Ok(config)
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Execute analyze subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the sequence cannot be
/// read. Failures of individual fragments are reported, not returned.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AnalyzeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let sequence = args.input.load(verbose)?;

    if verbose {
        eprintln!(
            "Using {} with closure {} and {} tries; structures saved to {}",
            config.topology.invariant,
            config.topology.closure_scheme,
            config.topology.sample_count,
            config.pipeline.output_dir.display()
        );
    }

    let topoly = TopolyCommand::new(config.topology.clone());
    if !topoly.is_available() {
        eprintln!(
            "Warning: Topoly could not be imported by {}; fragments will be reported as indeterminate",
            config.topology.python.display()
        );
    }

    let analyzer = FragmentAnalyzer::from_config(
        Box::new(EsmFoldClient::new(config.prediction.clone())?),
        Box::new(topoly),
        &config.pipeline,
        &config.topology,
    );
    let report = Pipeline::new(config.pipeline.clone(), analyzer).run(&sequence)?;

    match format {
        OutputFormat::Text => print_text_results(&report, verbose),
        OutputFormat::Json => print_json_results(&report)?,
        OutputFormat::Tsv => print_tsv_results(&report),
    }

    if !report.is_complete() {
        eprintln!(
            "Warning: {} of {} fragments could not be analyzed; the conclusion covers only the remaining fragments",
            report.failed_count, report.attempted_count
        );
    }

    Ok(())
}

fn print_text_results(report: &PipelineReport, verbose: bool) {
    println!(
        "Sequence: {} residues (md5 {})",
        report.sequence_length, report.sequence_md5
    );
    println!(
        "Mode: {} ({} of {} fragments analyzed)",
        report.mode,
        report.analyzed_count(),
        report.attempted_count
    );
    println!("\nConclusion: {}", report.conclusion);

    if report.results.is_empty() {
        return;
    }

    let heading = if report.knotted().count() == report.results.len() {
        "Knotted fragments"
    } else {
        "Fragments"
    };
    println!("\n{heading}:");
    for result in &report.results {
        print_text_fragment(result, verbose);
    }
}

fn print_text_fragment(result: &FragmentResult, verbose: bool) {
    println!(
        "   residues {}: {} (knotted probability {:.1}%)",
        result.range,
        result.verdict.dominant_type,
        result.verdict.knotted_probability * 100.0
    );
    println!(
        "      quality (pLDDT): {} ({})",
        result.quality, result.quality_status
    );
    if result.indeterminate {
        println!("      topology could not be computed");
    }
    if let Some(path) = &result.structure_path {
        println!("      structure: {}", path.display());
    }
    if verbose {
        for (label, probability) in &result.verdict.distribution {
            println!("      {label}: {probability:.3}");
        }
    }
}

fn print_json_results(report: &PipelineReport) -> anyhow::Result<()> {
    let mut output = serde_json::to_value(report)?;
    if let Some(object) = output.as_object_mut() {
        object.insert("complete".to_string(), report.is_complete().into());
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(report: &PipelineReport) {
    println!(
        "start\tend\tdominant_type\tknotted_probability\tquality\tquality_status\tis_knotted\tindeterminate\tstructure"
    );
    for result in &report.results {
        println!(
            "{}\t{}\t{}\t{:.4}\t{:.1}\t{}\t{}\t{}\t{}",
            result.range.first_residue(),
            result.range.last_residue(),
            result.verdict.dominant_type,
            result.verdict.knotted_probability,
            result.quality.value(),
            result.quality_status,
            result.is_knotted,
            result.indeterminate,
            result
                .structure_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
    }
}
