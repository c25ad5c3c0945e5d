use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analysis::fragment::{FragmentAnalyzer, FragmentResult};
use crate::analysis::window::WindowPlanner;
use crate::config::{ConfigurationError, PipelineConfig};
use crate::core::range::Fragment;
use crate::core::sequence::Sequence;
use crate::core::types::{AnalysisMode, Conclusion};

/// Parameters a report was produced with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportParameters {
    pub knot_threshold: f64,
    pub ambiguity_floor: f64,
    pub window_size: usize,
    pub overlap: usize,
    pub min_fragment_size: usize,
    pub sample_count: u32,
}

/// Final outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub mode: AnalysisMode,
    pub sequence_length: usize,
    pub sequence_md5: String,
    pub generated_at: DateTime<Utc>,
    pub parameters: ReportParameters,
    /// Direct mode: the single result. Windowed mode: knotted fragments only.
    /// Ordered by residue range.
    pub results: Vec<FragmentResult>,
    pub attempted_count: usize,
    pub failed_count: usize,
    pub conclusion: Conclusion,
}

impl PipelineReport {
    /// Fragments for which a structure was obtained
    pub fn analyzed_count(&self) -> usize {
        self.attempted_count - self.failed_count
    }

    /// True when every attempted fragment was analyzed.
    ///
    /// An `Unknotted` conclusion from an incomplete report only means that no
    /// knot was found in the fragments that could be analyzed.
    pub fn is_complete(&self) -> bool {
        self.attempted_count > 0 && self.failed_count == 0
    }

    pub fn knotted(&self) -> impl Iterator<Item = &FragmentResult> {
        self.results.iter().filter(|r| r.is_knotted)
    }
}

/// Derive the overall conclusion from fragment results.
///
/// Any knotted fragment makes the sequence knotted. A direct-mode result that
/// is not knotted is only confidently unknotted below `ambiguity_floor`;
/// between the floor and the threshold it is ambiguous.
pub fn derive_conclusion(
    mode: AnalysisMode,
    results: &[FragmentResult],
    ambiguity_floor: f64,
) -> Conclusion {
    if results.iter().any(|r| r.is_knotted) {
        return Conclusion::Knotted;
    }

    match (mode, results) {
        (AnalysisMode::Direct, [result])
            if result.verdict.knotted_probability >= ambiguity_floor =>
        {
            Conclusion::Ambiguous
        }
        _ => Conclusion::Unknotted,
    }
}

/// Chooses single-shot or sliding-window analysis and aggregates the results
pub struct Pipeline {
    config: PipelineConfig,
    analyzer: Arc<FragmentAnalyzer>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, analyzer: FragmentAnalyzer) -> Self {
        Self {
            config,
            analyzer: Arc::new(analyzer),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mode_for(&self, sequence_length: usize) -> AnalysisMode {
        if sequence_length > self.config.single_shot_limit {
            AnalysisMode::Windowed
        } else {
            AnalysisMode::Direct
        }
    }

    /// Analyze `sequence` and build the report.
    ///
    /// Must not be called from within an async runtime: fragment analysis
    /// blocks, and concurrent dispatch starts its own runtime.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the configuration is invalid. This is
    /// checked before any fragment is attempted; fragment failures never abort
    /// the run.
    pub fn run(&self, sequence: &Sequence) -> Result<PipelineReport, ConfigurationError> {
        self.config.validate()?;
        if self.analyzer.evaluator().sample_count() == 0 {
            return Err(ConfigurationError::Invalid(
                "sample count must be at least 1".to_string(),
            ));
        }

        let mode = self.mode_for(sequence.len());
        let (results, attempted, failed) = match mode {
            AnalysisMode::Direct => {
                tracing::info!(
                    "Sequence length ({}) within single-shot limit of {}",
                    sequence.len(),
                    self.config.single_shot_limit
                );
                let outcomes = self.dispatch(vec![Fragment::whole(sequence)]);
                let failed = outcomes.iter().filter(|o| o.is_none()).count();
                (outcomes.into_iter().flatten().collect(), 1, failed)
            }
            AnalysisMode::Windowed => self.run_windowed(sequence)?,
        };

        tracing::info!(
            "Analysis complete: {}/{} fragments analyzed",
            attempted - failed,
            attempted
        );
        if failed > 0 {
            tracing::warn!("{failed} of {attempted} fragments could not be analyzed");
        }

        let conclusion = derive_conclusion(mode, &results, self.config.ambiguity_floor);

        Ok(PipelineReport {
            mode,
            sequence_length: sequence.len(),
            sequence_md5: sequence.md5(),
            generated_at: Utc::now(),
            parameters: ReportParameters {
                knot_threshold: self.config.knot_threshold,
                ambiguity_floor: self.config.ambiguity_floor,
                window_size: self.config.window_size,
                overlap: self.config.overlap,
                min_fragment_size: self.config.min_fragment_size,
                sample_count: self.analyzer.evaluator().sample_count(),
            },
            results,
            attempted_count: attempted,
            failed_count: failed,
            conclusion,
        })
    }

    fn run_windowed(
        &self,
        sequence: &Sequence,
    ) -> Result<(Vec<FragmentResult>, usize, usize), ConfigurationError> {
        let planner = WindowPlanner::new(
            self.config.window_size,
            self.config.overlap,
            self.config.min_fragment_size,
        )?;

        tracing::info!(
            "Large sequence detected ({} > {}); using sliding windows (window={}, overlap={})",
            sequence.len(),
            self.config.single_shot_limit,
            planner.window_size,
            planner.overlap
        );

        let fragments: Vec<Fragment> = planner
            .plan(sequence.len())
            .map(|range| Fragment::from_sequence(sequence, range))
            .collect();
        let attempted = fragments.len();

        let outcomes = self.dispatch(fragments);
        let failed = outcomes.iter().filter(|o| o.is_none()).count();
        let knotted = outcomes
            .into_iter()
            .flatten()
            .filter(|r| r.is_knotted)
            .collect();

        Ok((knotted, attempted, failed))
    }

    /// Analyze fragments, returning outcomes in the order given
    fn dispatch(&self, fragments: Vec<Fragment>) -> Vec<Option<FragmentResult>> {
        if self.config.concurrency <= 1 || fragments.len() <= 1 {
            return self.dispatch_sequential(fragments);
        }

        match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.config.concurrency)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.dispatch_concurrent(fragments)),
            Err(e) => {
                tracing::warn!("Failed to start worker pool ({e}); analyzing sequentially");
                self.dispatch_sequential(fragments)
            }
        }
    }

    fn dispatch_sequential(&self, fragments: Vec<Fragment>) -> Vec<Option<FragmentResult>> {
        let total = fragments.len();
        fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| {
                tracing::info!(
                    "Processing fragment {}/{total}: residues {}",
                    i + 1,
                    fragment.range
                );
                self.analyzer.analyze(fragment, self.config.knot_threshold)
            })
            .collect()
    }

    /// At most `concurrency` fragments are in flight at once
    async fn dispatch_concurrent(&self, fragments: Vec<Fragment>) -> Vec<Option<FragmentResult>> {
        let total = fragments.len();
        let threshold = self.config.knot_threshold;
        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (index, fragment) in fragments.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let analyzer = Arc::clone(&self.analyzer);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                tracing::info!(
                    "Processing fragment {}/{total}: residues {}",
                    index + 1,
                    fragment.range
                );
                (index, analyzer.analyze(&fragment, threshold))
            });
        }

        let mut outcomes = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = outcome,
                Err(e) => tracing::error!("Fragment task did not complete: {e}"),
            }
        }
        outcomes
    }
}
