//! Feature extraction, classification, training, and evaluation.

pub mod bayes;
pub mod error;
pub mod metrics;
pub mod trainer;
pub mod vectorizer;

pub use bayes::{MultinomialNb, SMOOTHING};
pub use error::PipelineError;
pub use metrics::{confusion_matrix, ClassMetrics, Evaluation};
pub use trainer::{train, train_test_split, train_with_holdout, TrainConfig, TrainedPipeline};
pub use vectorizer::{SparseVector, TfidfVectorizer};
