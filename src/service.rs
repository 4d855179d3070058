//! Serving-boundary types and handlers.
//!
//! The transport layer lives outside this crate; it hands request bodies to
//! these handlers and serializes whatever comes back. Handlers never touch
//! shared mutable state, so one failed request cannot affect another.

use log::info;
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;
use crate::predictor::Predictor;

/// Body of a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub description: String,
}

/// Body of a prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub description: String,
    pub prediction: String,
}

/// Body of a label-listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsResponse {
    pub labels: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Request body is missing")]
    MissingBody,
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PipelineError),
}

impl ServiceError {
    /// Whether the fault lies with the request rather than the server; the
    /// transport maps this to its 4xx/5xx distinction.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingBody | Self::MalformedBody(_))
    }
}

/// Returns the ordered label vocabulary. No parameters.
pub fn handle_labels(predictor: &Predictor) -> LabelsResponse {
    LabelsResponse {
        labels: predictor.labels().to_vec(),
    }
}

/// Runs one prediction for a JSON request body.
///
/// `body` is `None` when the transport received no body at all; that is a
/// client error, as is undecodable JSON.
pub fn handle_predict(
    predictor: &Predictor,
    body: Option<&str>,
) -> Result<PredictResponse, ServiceError> {
    let body = body.ok_or(ServiceError::MissingBody)?;
    let request: PredictRequest = serde_json::from_str(body)?;
    let prediction = predictor.predict(&request.description)?;
    let response = PredictResponse {
        description: request.description,
        prediction,
    };
    info!("Prediction generated: {:?}", response);
    Ok(response)
}
