use std::fmt;

/// Represents the different types of errors that can occur in the
/// feature/model pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Error occurred while fitting the vectorizer or classifier
    TrainingError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrainingError(msg) => write!(f, "Training error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
