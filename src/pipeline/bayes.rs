use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::vectorizer::SparseVector;

/// Additive (Laplace) smoothing constant for feature likelihoods.
pub const SMOOTHING: f64 = 1.0;

/// Multinomial Naive-Bayes classifier over weighted token features.
///
/// Training estimates, per class, a smoothed log-likelihood for every
/// feature and a log-prior from label frequency. Prediction selects the
/// class maximizing the class log-prior plus the feature log-likelihoods
/// weighted by the query vector; ties break toward the lower class index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    /// Fits the classifier on sparse feature vectors and class targets.
    ///
    /// `n_classes` and `n_features` fix the parameter shapes; every target
    /// must lie below `n_classes` and every feature index below
    /// `n_features`.
    pub fn fit(
        vectors: &[SparseVector],
        targets: &[usize],
        n_classes: usize,
        n_features: usize,
    ) -> Result<Self, PipelineError> {
        if vectors.is_empty() {
            return Err(PipelineError::TrainingError(
                "cannot fit classifier on an empty training set".into(),
            ));
        }
        if vectors.len() != targets.len() {
            return Err(PipelineError::TrainingError(format!(
                "feature/target length mismatch: {} vectors, {} targets",
                vectors.len(),
                targets.len()
            )));
        }
        if n_classes == 0 {
            return Err(PipelineError::TrainingError("no classes to fit".into()));
        }

        let mut class_count = Array1::<f64>::zeros(n_classes);
        let mut feature_count = Array2::<f64>::zeros((n_classes, n_features));
        for (vector, &class) in vectors.iter().zip(targets) {
            if class >= n_classes {
                return Err(PipelineError::ValidationError(format!(
                    "target class {} out of range (n_classes = {})",
                    class, n_classes
                )));
            }
            class_count[class] += 1.0;
            for (index, value) in vector.iter() {
                if index >= n_features {
                    return Err(PipelineError::ValidationError(format!(
                        "feature index {} out of range (n_features = {})",
                        index, n_features
                    )));
                }
                feature_count[[class, index]] += value;
            }
        }

        let n_samples = vectors.len() as f64;
        let class_log_prior = class_count.mapv(|count| (count / n_samples).ln());

        let mut feature_log_prob = feature_count;
        for class in 0..n_classes {
            let total: f64 = feature_log_prob.row(class).sum();
            let denominator = total + SMOOTHING * n_features as f64;
            feature_log_prob
                .row_mut(class)
                .mapv_inplace(|count| ((count + SMOOTHING) / denominator).ln());
        }

        Ok(Self {
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.class_log_prior.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    /// Per-class unnormalized posterior log-scores for one query vector.
    ///
    /// Feature indices outside the trained range contribute nothing, like
    /// any other out-of-vocabulary evidence.
    pub fn joint_log_likelihood(&self, vector: &SparseVector) -> Array1<f64> {
        let mut scores = self.class_log_prior.clone();
        for (index, value) in vector.iter() {
            if index >= self.n_features() {
                continue;
            }
            for class in 0..self.n_classes() {
                scores[class] += self.feature_log_prob[[class, index]] * value;
            }
        }
        scores
    }

    /// Predicts the class index for one query vector.
    ///
    /// An empty vector is legal input: the scores reduce to the class
    /// priors, so the most frequent training class wins.
    pub fn predict(&self, vector: &SparseVector) -> Result<usize, PipelineError> {
        let scores = self.joint_log_likelihood(vector);
        if scores.is_empty() {
            return Err(PipelineError::PredictionError(
                "classifier has no classes".into(),
            ));
        }
        let mut best = 0;
        for class in 1..scores.len() {
            if scores[class] > scores[best] {
                best = class;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(usize, f64)]) -> SparseVector {
        SparseVector {
            indices: entries.iter().map(|(i, _)| *i).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
        }
    }

    fn separable_model() -> MultinomialNb {
        // feature 0 dominates class 0, feature 1 dominates class 1
        let vectors = vec![
            vector(&[(0, 1.0)]),
            vector(&[(0, 1.0)]),
            vector(&[(1, 1.0)]),
            vector(&[(1, 1.0)]),
        ];
        MultinomialNb::fit(&vectors, &[0, 0, 1, 1], 2, 2).unwrap()
    }

    #[test]
    fn test_separable_classes_are_recovered() {
        let model = separable_model();
        assert_eq!(model.predict(&vector(&[(0, 1.0)])).unwrap(), 0);
        assert_eq!(model.predict(&vector(&[(1, 1.0)])).unwrap(), 1);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let model = separable_model();
        let query = vector(&[(0, 0.4), (1, 0.6)]);
        let first = model.predict(&query).unwrap();
        let second = model.predict(&query).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_vector_falls_back_to_prior() {
        let vectors = vec![
            vector(&[(0, 1.0)]),
            vector(&[(0, 1.0)]),
            vector(&[(0, 1.0)]),
            vector(&[(1, 1.0)]),
        ];
        let model = MultinomialNb::fit(&vectors, &[1, 1, 1, 0], 2, 2).unwrap();
        // class 1 holds three of four training samples
        assert_eq!(model.predict(&vector(&[])).unwrap(), 1);
    }

    #[test]
    fn test_tie_breaks_toward_lower_index() {
        let vectors = vec![vector(&[(0, 1.0)]), vector(&[(0, 1.0)])];
        let model = MultinomialNb::fit(&vectors, &[0, 1], 2, 1).unwrap();
        // symmetric classes score identically on symmetric evidence
        assert_eq!(model.predict(&vector(&[(0, 1.0)])).unwrap(), 0);
    }

    #[test]
    fn test_smoothing_matches_laplace_formula() {
        let vectors = vec![vector(&[(0, 2.0), (1, 1.0)])];
        let model = MultinomialNb::fit(&vectors, &[0], 1, 2).unwrap();
        let expected_0 = ((2.0 + SMOOTHING) / (3.0 + SMOOTHING * 2.0)).ln();
        let expected_1 = ((1.0 + SMOOTHING) / (3.0 + SMOOTHING * 2.0)).ln();
        assert!((model.feature_log_prob[[0, 0]] - expected_0).abs() < 1e-12);
        assert!((model.feature_log_prob[[0, 1]] - expected_1).abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_out_of_range_target() {
        let vectors = vec![vector(&[(0, 1.0)])];
        assert!(matches!(
            MultinomialNb::fit(&vectors, &[3], 2, 1),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let vectors = vec![vector(&[(0, 1.0)])];
        assert!(matches!(
            MultinomialNb::fit(&vectors, &[0, 1], 2, 1),
            Err(PipelineError::TrainingError(_))
        ));
    }
}
