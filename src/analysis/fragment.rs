use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::artifacts::{ArtifactError, ArtifactStore};
use crate::analysis::quality::{QualityAssessor, QualityScore};
use crate::config::{PipelineConfig, TopologyConfig};
use crate::core::range::{Fragment, ResidueRange};
use crate::core::types::QualityStatus;
use crate::parsing::pdb::{ParseError, StructureModel};
use crate::predict::{PredictionError, StructurePredictor};
use crate::topology::{KnotInvariant, TopologyClassifier, TopologyVerdict};

/// Progress of a single fragment through analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentState {
    /// Sequence sent to the prediction service
    Submitted,
    /// Structure received, parsed and persisted
    Structured,
    Assessed,
    Classified,
    Done,
    Failed,
}

#[derive(Error, Debug)]
pub enum FragmentError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("Invalid structure: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Outcome of analyzing one fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentResult {
    pub range: ResidueRange,
    pub quality: QualityScore,
    pub quality_status: QualityStatus,
    pub verdict: TopologyVerdict,
    /// `verdict.knotted_probability > threshold`
    pub is_knotted: bool,
    /// Topology could not be computed; `verdict` is the unknotted fallback
    pub indeterminate: bool,
    pub structure_path: Option<PathBuf>,
}

/// Quality assessment and topology classification of an existing structure
pub struct StructureEvaluator {
    assessor: QualityAssessor,
    classifier: TopologyClassifier,
    min_quality: f64,
    closure_scheme: u8,
    sample_count: u32,
}

impl StructureEvaluator {
    pub fn new(
        invariant: Box<dyn KnotInvariant>,
        pipeline: &PipelineConfig,
        topology: &TopologyConfig,
    ) -> Self {
        Self {
            assessor: QualityAssessor::new(pipeline.empty_confidence_default),
            classifier: TopologyClassifier::new(invariant),
            min_quality: pipeline.min_quality,
            closure_scheme: topology.closure_scheme,
            sample_count: topology.sample_count,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Mean pLDDT of `structure` and whether it clears the reliability cutoff
    pub fn assess(&self, structure: &StructureModel) -> (QualityScore, QualityStatus) {
        let quality = self.assessor.assess(structure);
        let status = QualityStatus::from_score(quality.value(), self.min_quality);
        tracing::info!("   -> Quality (pLDDT): {quality} ({status})");
        (quality, status)
    }

    /// Topology verdict of `structure`, and whether it is the fallback used
    /// after a failed computation
    pub fn classify(
        &self,
        range: ResidueRange,
        structure: &StructureModel,
    ) -> (TopologyVerdict, bool) {
        let outcome = self
            .classifier
            .classify(structure, self.closure_scheme, self.sample_count);

        let (verdict, indeterminate) = match outcome {
            Ok(verdict) => (verdict, false),
            Err(e) => {
                tracing::error!("Topology analysis failed for residues {range}: {e}");
                (TopologyVerdict::unknotted(), true)
            }
        };
        tracing::info!(
            "   -> Knot Probability: {:.1}% (dominant {})",
            verdict.knotted_probability * 100.0,
            verdict.dominant_type
        );
        (verdict, indeterminate)
    }

    /// Assess and classify `structure`, calling it knotted above `threshold`.
    ///
    /// A failed topology computation does not fail the evaluation: the result
    /// carries the unknotted fallback verdict and is flagged `indeterminate`.
    pub fn evaluate(
        &self,
        range: ResidueRange,
        structure: &StructureModel,
        threshold: f64,
    ) -> FragmentResult {
        let quality = self.assess(structure);
        let verdict = self.classify(range, structure);
        FragmentResult::decide(range, quality, verdict, threshold, structure)
    }
}

impl FragmentResult {
    fn decide(
        range: ResidueRange,
        (quality, quality_status): (QualityScore, QualityStatus),
        (verdict, indeterminate): (TopologyVerdict, bool),
        threshold: f64,
        structure: &StructureModel,
    ) -> Self {
        Self {
            range,
            quality,
            quality_status,
            is_knotted: verdict.knotted_probability > threshold,
            verdict,
            indeterminate,
            structure_path: structure.path().map(std::path::Path::to_path_buf),
        }
    }
}

/// Drives one fragment from sequence to verdict
pub struct FragmentAnalyzer {
    predictor: Box<dyn StructurePredictor>,
    store: ArtifactStore,
    evaluator: StructureEvaluator,
}

impl FragmentAnalyzer {
    pub fn new(
        predictor: Box<dyn StructurePredictor>,
        store: ArtifactStore,
        evaluator: StructureEvaluator,
    ) -> Self {
        Self {
            predictor,
            store,
            evaluator,
        }
    }

    /// Build an analyzer from configuration, persisting into `pipeline.output_dir`
    pub fn from_config(
        predictor: Box<dyn StructurePredictor>,
        invariant: Box<dyn KnotInvariant>,
        pipeline: &PipelineConfig,
        topology: &TopologyConfig,
    ) -> Self {
        Self::new(
            predictor,
            ArtifactStore::new(&pipeline.output_dir),
            StructureEvaluator::new(invariant, pipeline, topology),
        )
    }

    pub fn evaluator(&self) -> &StructureEvaluator {
        &self.evaluator
    }

    /// Analyze `fragment`, returning `None` if no structure could be obtained.
    ///
    /// Failures are local to the fragment: they are logged, never retried here,
    /// and never propagated to the caller.
    pub fn analyze(&self, fragment: &Fragment, threshold: f64) -> Option<FragmentResult> {
        match self.run(fragment, threshold) {
            Ok(result) => Some(result),
            Err((state, error)) => {
                if matches!(
                    error,
                    FragmentError::Prediction(PredictionError::PayloadTooLarge { .. })
                ) {
                    tracing::error!(
                        "Fragment {} is too long for the prediction service (HTTP 413)",
                        fragment.range
                    );
                } else {
                    tracing::error!(
                        "Fragment {} failed in state {state:?}: {error}",
                        fragment.range
                    );
                }
                tracing::debug!("Fragment {} -> {:?}", fragment.range, FragmentState::Failed);
                None
            }
        }
    }

    fn run(
        &self,
        fragment: &Fragment,
        threshold: f64,
    ) -> Result<FragmentResult, (FragmentState, FragmentError)> {
        let range = fragment.range;
        let transition = |state: FragmentState| {
            tracing::debug!("Fragment {range} -> {state:?}");
            state
        };

        let state = transition(FragmentState::Submitted);
        let text = self
            .predictor
            .predict(&fragment.residues)
            .map_err(|e| (state, FragmentError::from(e)))?;

        let state = transition(FragmentState::Structured);
        let structure = StructureModel::parse(text).map_err(|e| (state, FragmentError::from(e)))?;
        let path = self
            .store
            .persist(&range, structure.text())
            .map_err(|e| (state, FragmentError::from(e)))?;
        let structure = structure.with_path(path);

        // Assessment and classification cannot fail the fragment
        let quality = self.evaluator.assess(&structure);
        transition(FragmentState::Assessed);
        let verdict = self.evaluator.classify(range, &structure);
        transition(FragmentState::Classified);

        let result = FragmentResult::decide(range, quality, verdict, threshold, &structure);
        transition(FragmentState::Done);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::Sequence;
    use crate::topology::{ClassificationError, Distribution};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PDB: &str = "\
ATOM      1  N   MET A   1      -8.901   4.127  -0.555  1.00 62.00           N
ATOM      2  CA  MET A   1      -8.608   3.135  -1.618  1.00 66.00           C
";

    struct StaticPredictor {
        response: Result<&'static str, u16>,
        calls: Arc<AtomicUsize>,
    }

    impl StructurePredictor for StaticPredictor {
        fn predict(&self, _sequence: &str) -> Result<String, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(413) => Err(PredictionError::PayloadTooLarge { length: 0 }),
                Err(status) => Err(PredictionError::Status {
                    status,
                    body: String::new(),
                }),
            }
        }
    }

    struct StaticInvariant(Option<f64>);

    impl KnotInvariant for StaticInvariant {
        fn distribution(
            &self,
            _structure: &StructureModel,
            _closure_scheme: u8,
            _sample_count: u32,
        ) -> Result<Distribution, ClassificationError> {
            let knotted = self
                .0
                .ok_or_else(|| ClassificationError::Invariant("no topoly".to_string()))?;
            Ok(Distribution::from([
                ("0_1".to_string(), 1.0 - knotted),
                ("3_1".to_string(), knotted),
            ]))
        }
    }

    fn analyzer(
        dir: &std::path::Path,
        response: Result<&'static str, u16>,
        knotted: Option<f64>,
    ) -> (FragmentAnalyzer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = PipelineConfig {
            output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let analyzer = FragmentAnalyzer::from_config(
            Box::new(StaticPredictor {
                response,
                calls: Arc::clone(&calls),
            }),
            Box::new(StaticInvariant(knotted)),
            &pipeline,
            &TopologyConfig::default(),
        );
        (analyzer, calls)
    }

    fn fragment() -> Fragment {
        Fragment::whole(&Sequence::sanitize("MKTAYIAKQRQISFVKSHFSRQ").unwrap())
    }

    #[test]
    fn test_successful_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, calls) = analyzer(dir.path(), Ok(PDB), Some(0.8));

        let result = analyzer.analyze(&fragment(), 0.5).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_knotted);
        assert!(!result.indeterminate);
        assert_eq!(result.verdict.dominant_type.0, "3_1");
        assert!((result.quality.value() - 64.0).abs() < 1e-9);
        assert_eq!(result.quality_status, QualityStatus::Unreliable);

        let path = result.structure_path.unwrap();
        assert_eq!(path, dir.path().join("fragment_1_22.pdb"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), PDB);
    }

    #[test]
    fn test_threshold_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), Ok(PDB), Some(0.5));

        let result = analyzer.analyze(&fragment(), 0.5).unwrap();
        assert!((result.verdict.knotted_probability - 0.5).abs() < 1e-9);
        assert!(!result.is_knotted);
    }

    #[test]
    fn test_transport_failure_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, calls) = analyzer(dir.path(), Err(503), Some(0.9));

        assert!(analyzer.analyze(&fragment(), 0.5).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("fragment_1_22.pdb").exists());
    }

    #[test]
    fn test_payload_too_large_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), Err(413), Some(0.9));
        assert!(analyzer.analyze(&fragment(), 0.5).is_none());
    }

    #[test]
    fn test_non_structure_response_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), Ok("upstream timeout"), Some(0.9));
        assert!(analyzer.analyze(&fragment(), 0.5).is_none());
    }

    #[test]
    fn test_classification_failure_is_indeterminate() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, _) = analyzer(dir.path(), Ok(PDB), None);

        let result = analyzer.analyze(&fragment(), 0.5).unwrap();
        assert!(result.indeterminate);
        assert!(!result.is_knotted);
        assert!(result.verdict.knotted_probability.abs() < f64::EPSILON);
        assert!(result.verdict.dominant_type.is_unknot());
    }
}
