use std::sync::Arc;

use log::info;

use crate::artifact::{ArtifactError, ArtifactStore, ModelArtifact};
use crate::corpus::filter_description;
use crate::pipeline::{MultinomialNb, PipelineError, TfidfVectorizer};

/// The serving-time classifier.
///
/// Loads the persisted artifact bundle eagerly (a missing or corrupt
/// artifact fails the load and the process must not start serving) and
/// afterwards holds only immutable shared-read state, so concurrent
/// predictions are independent stateless calls with no locking.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact_path: String,
    labels: Arc<Vec<String>>,
    vectorizer: Arc<TfidfVectorizer>,
    classifier: Arc<MultinomialNb>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

/// Information about the loaded model, for diagnostics and listings.
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    pub artifact_path: String,
    pub num_classes: usize,
    pub vocabulary_size: usize,
}

impl Predictor {
    /// Loads the artifact written by training run `seed` from `store`.
    pub fn load(store: &ArtifactStore, seed: u64) -> Result<Self, ArtifactError> {
        let path = store.classifier_path(seed);
        let artifact = store.load_artifact(seed)?;
        info!(
            "Loaded model artifact from {} ({} classes, {} terms)",
            path.display(),
            artifact.labels.len(),
            artifact.vectorizer.vocabulary_len()
        );
        Ok(Self::from_parts(
            path.to_string_lossy().into_owned(),
            artifact,
        ))
    }

    /// Wraps an in-memory artifact, e.g. one just trained.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self::from_parts("<in-memory>".to_string(), artifact)
    }

    fn from_parts(artifact_path: String, artifact: ModelArtifact) -> Self {
        Self {
            artifact_path,
            labels: Arc::new(artifact.labels),
            vectorizer: Arc::new(artifact.vectorizer),
            classifier: Arc::new(artifact.classifier),
        }
    }

    /// Predicts the human-readable label for a raw description.
    ///
    /// The input passes through the same alphabetic-only token filter used
    /// at training time; whatever survives, including nothing at all,
    /// flows through the vectorizer and classifier unchanged. Repeated calls
    /// with the same input return the same label.
    pub fn predict(&self, description: &str) -> Result<String, PipelineError> {
        let filtered = filter_description(description);
        let vector = self.vectorizer.transform(&filtered);
        let index = self.classifier.predict(&vector)?;
        self.labels.get(index).cloned().ok_or_else(|| {
            PipelineError::PredictionError(format!(
                "predicted class index {} is missing from the label vocabulary",
                index
            ))
        })
    }

    /// The full label vocabulary in class-index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            artifact_path: self.artifact_path.clone(),
            num_classes: self.labels.len(),
            vocabulary_size: self.vectorizer.vocabulary_len(),
        }
    }
}
