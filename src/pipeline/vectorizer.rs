use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// A sparse document vector: parallel index/value arrays, sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Term-frequency–inverse-document-frequency vectorizer.
///
/// The vocabulary is the set of whitespace tokens seen during fitting, in
/// first-seen order. The weight of token `t` in document `d` is
/// `tf(t, d) * idf(t)` with the smoothed inverse document frequency
/// `ln((1 + N) / (1 + df(t))) + 1`, and each document vector is then
/// L2-normalized. Out-of-vocabulary tokens contribute zero weight; an
/// all-unknown or empty document transforms to the empty vector, never an
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fits vocabulary and IDF weights over the training documents.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, PipelineError> {
        if documents.is_empty() {
            return Err(PipelineError::ValidationError(
                "cannot fit vectorizer on an empty document set".into(),
            ));
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for document in documents {
            let mut seen_here: HashSet<usize> = HashSet::new();
            for token in document.as_ref().split_whitespace() {
                let next_index = vocabulary.len();
                let index = *vocabulary
                    .entry(token.to_string())
                    .or_insert(next_index);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if seen_here.insert(index) {
                    document_frequency[index] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Ok(Self { vocabulary, idf })
    }

    /// Fits the vectorizer and transforms the same documents in one pass.
    pub fn fit_transform<S: AsRef<str>>(
        documents: &[S],
    ) -> Result<(Self, Vec<SparseVector>), PipelineError> {
        let vectorizer = Self::fit(documents)?;
        let vectors = documents
            .iter()
            .map(|doc| vectorizer.transform(doc.as_ref()))
            .collect();
        Ok((vectorizer, vectors))
    }

    /// Transforms one document into its normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in document.split_whitespace() {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        entries.sort_unstable_by_key(|(index, _)| *index);

        let norm: f64 = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }

        let (indices, values) = entries.into_iter().unzip();
        SparseVector { indices, values }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Fitted IDF weight of `token`, if in vocabulary.
    pub fn idf_of(&self, token: &str) -> Option<f64> {
        self.vocabulary.get(token).map(|&index| self.idf[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_rejects_empty_corpus() {
        let documents: Vec<String> = Vec::new();
        assert!(matches!(
            TfidfVectorizer::fit(&documents),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_smoothed_idf_formula() {
        let documents = ["shoes shoes red", "phone red"];
        let vectorizer = TfidfVectorizer::fit(&documents).unwrap();
        // df("red") = 2, N = 2 -> ln(3/3) + 1 = 1
        assert!((vectorizer.idf_of("red").unwrap() - 1.0).abs() < 1e-12);
        // df("shoes") = 1 -> ln(3/2) + 1
        let expected = (3.0_f64 / 2.0).ln() + 1.0;
        assert!((vectorizer.idf_of("shoes").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let documents = ["nice red running shoes", "great cheap phone"];
        let vectorizer = TfidfVectorizer::fit(&documents).unwrap();
        let vector = vectorizer.transform("nice red shoes shoes");
        assert!((vector.l2_norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_tokens_contribute_nothing() {
        let documents = ["nice red shoes"];
        let vectorizer = TfidfVectorizer::fit(&documents).unwrap();
        let vector = vectorizer.transform("unseen words only");
        assert!(vector.is_empty());
        assert_eq!(vector.l2_norm(), 0.0);
    }

    #[test]
    fn test_empty_document_transforms_to_empty_vector() {
        let documents = ["nice red shoes"];
        let vectorizer = TfidfVectorizer::fit(&documents).unwrap();
        assert!(vectorizer.transform("").is_empty());
    }

    #[test]
    fn test_term_frequency_scales_weight() {
        let documents = ["shoes phone", "shoes phone"];
        let vectorizer = TfidfVectorizer::fit(&documents).unwrap();
        let single = vectorizer.transform("shoes phone");
        // equal counts and equal idf -> equal normalized weights
        assert_eq!(single.values.len(), 2);
        assert!((single.values[0] - single.values[1]).abs() < 1e-12);

        let doubled = vectorizer.transform("shoes shoes phone");
        let shoes_weight = doubled.values[doubled
            .indices
            .iter()
            .position(|&i| i == single.indices[0])
            .unwrap()];
        let phone_weight = doubled.values[doubled
            .indices
            .iter()
            .position(|&i| i == single.indices[1])
            .unwrap()];
        assert!(shoes_weight > phone_weight);
    }
}
