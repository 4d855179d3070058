//! A single-label product-description classifier with corpus curation.
//!
//! The crate covers the full path from a noisy `__label__`-marked corpus to
//! served predictions: parsing and filtering raw records, curating a clean
//! single-label training table with deterministic per-label sampling,
//! fitting a TF-IDF + multinomial Naive-Bayes pipeline, persisting the
//! fitted pipeline as one versioned artifact, and answering predictions
//! from an immutable in-memory copy of that artifact.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use stocktag::{CuratedRow, ModelArtifact, Predictor, train_with_holdout};
//!
//! let rows = vec![
//!     CuratedRow { description: "nice red running shoes".into(), label_index: 0 },
//!     CuratedRow { description: "great cheap android phone".into(), label_index: 1 },
//! ];
//! let labels = vec!["shoes".to_string(), "electronics".to_string()];
//!
//! let (pipeline, _evaluation) = train_with_holdout(&rows, &[], &labels)?;
//! let predictor = Predictor::from_artifact(ModelArtifact::new(labels, pipeline));
//!
//! assert_eq!(predictor.predict("very nice shoes")?, "shoes");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`Predictor`] holds only immutable shared state and is `Send + Sync`;
//! wrap it in an `Arc` and predict from as many threads as the transport
//! needs. Curation and training are single-threaded batch runs.

pub mod artifact;
pub mod corpus;
pub mod pipeline;
pub mod predictor;
pub mod service;

pub use artifact::{ArtifactError, ArtifactStore, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use corpus::{
    curate_round_robin, curate_single_table, filter_description, parse_line, CorpusReader,
    CuratedRow, CuratedTable, CurationMode, CurationReport, Curator, LabelVocabulary,
    ParsedRecord, MAX_ROWS_PER_LABEL,
};
pub use pipeline::{
    train, train_with_holdout, Evaluation, MultinomialNb, PipelineError, TfidfVectorizer,
    TrainConfig, TrainedPipeline,
};
pub use predictor::{Predictor, PredictorInfo};
pub use service::{
    handle_labels, handle_predict, LabelsResponse, PredictRequest, PredictResponse, ServiceError,
};

pub fn init_logger() {
    env_logger::init();
}
