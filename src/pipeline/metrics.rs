use std::fmt;

use log::info;
use ndarray::Array2;

/// Confusion matrix over class indices: rows are true classes, columns are
/// predicted classes, both in class-index order.
pub fn confusion_matrix(truth: &[usize], predicted: &[usize], n_classes: usize) -> Array2<u64> {
    let mut matrix = Array2::<u64>::zeros((n_classes, n_classes));
    for (&actual, &guess) in truth.iter().zip(predicted) {
        matrix[[actual, guess]] += 1;
    }
    matrix
}

/// Precision/recall/F1 for one class, with its held-out support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Held-out evaluation results: confusion matrix, per-class report, and
/// overall accuracy. Observational output only, never a control-flow signal.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub labels: Vec<String>,
    pub confusion: Array2<u64>,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
}

impl Evaluation {
    pub fn from_predictions(truth: &[usize], predicted: &[usize], labels: &[String]) -> Self {
        debug_assert_eq!(truth.len(), predicted.len());
        let n_classes = labels.len();
        let confusion = confusion_matrix(truth, predicted, n_classes);

        let per_class = (0..n_classes)
            .map(|class| {
                let true_positives = confusion[[class, class]] as f64;
                let support: u64 = confusion.row(class).sum();
                let predicted_total: u64 = confusion.column(class).sum();
                let precision = ratio(true_positives, predicted_total as f64);
                let recall = ratio(true_positives, support as f64);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let correct = truth
            .iter()
            .zip(predicted)
            .filter(|(actual, guess)| actual == guess)
            .count();
        let accuracy = ratio(correct as f64, truth.len() as f64);

        Self {
            labels: labels.to_vec(),
            confusion,
            per_class,
            accuracy,
        }
    }

    /// Emits the evaluation as info-level log output.
    pub fn log(&self) {
        info!("Confusion matrix:\n{}", self.confusion);
        info!("Classification report\n{}", self);
        info!("Accuracy: {}", self.accuracy);
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("label".len());
        writeln!(
            f,
            "{:width$}  precision  recall  f1-score  support",
            "label",
            width = width
        )?;
        for (label, metrics) in self.labels.iter().zip(&self.per_class) {
            writeln!(
                f,
                "{:width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
                label,
                metrics.precision,
                metrics.recall,
                metrics.f1,
                metrics.support,
                width = width
            )?;
        }
        write!(f, "accuracy: {:.4}", self.accuracy)
    }
}
