use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::corpus::{CuratedRow, CuratedTable};

use super::bayes::MultinomialNb;
use super::error::PipelineError;
use super::metrics::Evaluation;
use super::vectorizer::TfidfVectorizer;

/// Training-run parameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    /// Fraction of curated rows held out for evaluation.
    pub split_ratio: f64,
    /// Seed of the deterministic shuffle; each value yields a reproducible
    /// split.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            split_ratio: 0.2,
            seed: 0,
        }
    }
}

/// The fitted vectorizer+classifier pair.
///
/// The two halves are fit together and must travel together; the class
/// output space is the integer indexing of the label vocabulary the
/// training table was curated against.
#[derive(Debug, Clone)]
pub struct TrainedPipeline {
    pub vectorizer: TfidfVectorizer,
    pub classifier: MultinomialNb,
}

impl TrainedPipeline {
    /// Predicts the class index for an already-filtered description.
    pub fn predict_index(&self, description: &str) -> Result<usize, PipelineError> {
        let vector = self.vectorizer.transform(description);
        self.classifier.predict(&vector)
    }
}

/// Deterministically shuffles `rows` and splits off `ceil(n * ratio)` of
/// them as the held-out subset. Same input order and seed, same split.
pub fn train_test_split(
    rows: &[CuratedRow],
    ratio: f64,
    seed: u64,
) -> (Vec<CuratedRow>, Vec<CuratedRow>) {
    let mut shuffled: Vec<CuratedRow> = rows.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let n_test = ((rows.len() as f64) * ratio).ceil() as usize;
    let train = shuffled.split_off(n_test);
    (train, shuffled)
}

/// Trains on a unified curated table, splitting a held-out subset on the fly.
///
/// This is the counterpart of single-table curation; tables pre-split by the
/// round-robin curator go through [`train_with_holdout`] instead. The two
/// modes are never mixed within one run.
pub fn train(
    table: &CuratedTable,
    labels: &[String],
    config: &TrainConfig,
) -> Result<(TrainedPipeline, Evaluation), PipelineError> {
    if !(config.split_ratio > 0.0 && config.split_ratio < 1.0) {
        return Err(PipelineError::ValidationError(format!(
            "split ratio must lie strictly between 0 and 1, got {}",
            config.split_ratio
        )));
    }
    let (train_rows, test_rows) = train_test_split(&table.rows, config.split_ratio, config.seed);
    info!(
        "Split {} curated rows into {} train / {} held-out (ratio {}, seed {})",
        table.len(),
        train_rows.len(),
        test_rows.len(),
        config.split_ratio,
        config.seed
    );
    train_with_holdout(&train_rows, &test_rows, labels)
}

/// Fits the pipeline on `train_rows` and evaluates it on `test_rows`.
pub fn train_with_holdout(
    train_rows: &[CuratedRow],
    test_rows: &[CuratedRow],
    labels: &[String],
) -> Result<(TrainedPipeline, Evaluation), PipelineError> {
    let n_classes = labels.len();
    for row in train_rows.iter().chain(test_rows) {
        if row.label_index >= n_classes {
            return Err(PipelineError::ValidationError(format!(
                "label index {} out of range (vocabulary holds {} labels)",
                row.label_index, n_classes
            )));
        }
    }

    let documents: Vec<&str> = train_rows.iter().map(|row| row.description.as_str()).collect();
    let targets: Vec<usize> = train_rows.iter().map(|row| row.label_index).collect();

    let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&documents)?;
    info!(
        "Fitted TF-IDF vectorizer: {} terms over {} documents",
        vectorizer.vocabulary_len(),
        documents.len()
    );
    let classifier = MultinomialNb::fit(&vectors, &targets, n_classes, vectorizer.vocabulary_len())?;

    let pipeline = TrainedPipeline {
        vectorizer,
        classifier,
    };

    let truth: Vec<usize> = test_rows.iter().map(|row| row.label_index).collect();
    let mut predicted = Vec::with_capacity(test_rows.len());
    for row in test_rows {
        predicted.push(pipeline.predict_index(&row.description)?);
    }
    let evaluation = Evaluation::from_predictions(&truth, &predicted, labels);
    evaluation.log();

    Ok((pipeline, evaluation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(description: &str, label_index: usize) -> CuratedRow {
        CuratedRow {
            description: description.to_string(),
            label_index,
        }
    }

    fn toy_table() -> (CuratedTable, Vec<String>) {
        let mut rows = Vec::new();
        for _ in 0..10 {
            rows.push(row("nice red running shoes", 0));
            rows.push(row("comfy leather walking shoes", 0));
            rows.push(row("great cheap android phone", 1));
            rows.push(row("fast shiny new phone", 1));
        }
        (
            CuratedTable { rows },
            vec!["shoes".to_string(), "electronics".to_string()],
        )
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let (table, _) = toy_table();
        let (train_a, test_a) = train_test_split(&table.rows, 0.2, 7);
        let (train_b, test_b) = train_test_split(&table.rows, 0.2, 7);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let (_, test_c) = train_test_split(&table.rows, 0.2, 8);
        assert_ne!(test_a, test_c);
    }

    #[test]
    fn test_split_sizes_use_ceiling() {
        let (table, _) = toy_table();
        let (train, test) = train_test_split(&table.rows, 0.2, 0);
        assert_eq!(test.len(), 8);
        assert_eq!(train.len(), 32);

        let (train, test) = train_test_split(&table.rows[..5], 0.5, 0);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 2);
    }

    #[test]
    fn test_separable_table_trains_to_full_accuracy() {
        let (table, labels) = toy_table();
        let (pipeline, evaluation) = train(&table, &labels, &TrainConfig::default()).unwrap();
        assert_eq!(evaluation.accuracy, 1.0);
        assert_eq!(pipeline.predict_index("red shoes please").unwrap(), 0);
        assert_eq!(pipeline.predict_index("cheap phone").unwrap(), 1);
    }

    #[test]
    fn test_same_seed_reproduces_evaluation() {
        let (table, labels) = toy_table();
        let config = TrainConfig {
            split_ratio: 0.25,
            seed: 42,
        };
        let (_, eval_a) = train(&table, &labels, &config).unwrap();
        let (_, eval_b) = train(&table, &labels, &config).unwrap();
        assert_eq!(eval_a.accuracy, eval_b.accuracy);
        assert_eq!(eval_a.confusion, eval_b.confusion);
    }

    #[test]
    fn test_invalid_split_ratio_is_rejected() {
        let (table, labels) = toy_table();
        for ratio in [0.0, 1.0, -0.3, 1.5] {
            let config = TrainConfig {
                split_ratio: ratio,
                seed: 0,
            };
            assert!(matches!(
                train(&table, &labels, &config),
                Err(PipelineError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_out_of_range_label_index_is_rejected() {
        let rows = vec![row("nice red shoes", 5)];
        let err = train_with_holdout(&rows, &[], &["shoes".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
    }
}
