//! TF-IDF vector space
//!
//! Vocabulary is built from tokens of at least two characters. Weights use
//! raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1` and L2
//! normalization, so cosine similarity reduces to a sparse dot product.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse vector sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_weights(weights: BTreeMap<usize, f64>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        let entries = if norm > 0.0 {
            weights.into_iter().map(|(idx, w)| (idx, w / norm)).collect()
        } else {
            Vec::new()
        };
        Self { entries }
    }

    /// True when no known term was present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Dot product of two index-sorted vectors.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_w) = self.entries[i];
            let (b_idx, b_w) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine similarity. Both sides are unit length or empty.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        self.dot(other)
    }
}

/// Fitted TF-IDF model.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

fn terms(document: &str) -> impl Iterator<Item = &str> {
    document
        .split_whitespace()
        .filter(|term| term.chars().count() >= 2)
}

impl TfidfVectorizer {
    /// Fit the vocabulary and idf weights over preprocessed documents.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for document in documents {
            let unique: HashSet<&str> = terms(document.as_ref()).collect();
            let mut sorted: Vec<&str> = unique.into_iter().collect();
            sorted.sort_unstable();
            for term in sorted {
                let idx = match vocabulary.get(term) {
                    Some(&idx) => idx,
                    None => {
                        let idx = vocabulary.len();
                        vocabulary.insert(term.to_string(), idx);
                        doc_freq.push(0);
                        idx
                    }
                };
                doc_freq[idx] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    /// Project a preprocessed document into the fitted space.
    ///
    /// Terms not seen during fitting are ignored.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms(document) {
            if let Some(&idx) = self.vocabulary.get(term) {
                *weights.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        for (idx, weight) in weights.iter_mut() {
            *weight *= self.idf[*idx];
        }
        SparseVector::from_weights(weights)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_fit_builds_vocabulary_without_short_terms() {
        let vectorizer = TfidfVectorizer::fit(&["a bébé dort", "le bébé mange"]);
        assert_eq!(vectorizer.vocabulary_size(), 4);
        assert!(vectorizer.idf("a").is_none());
    }

    #[test]
    fn test_smoothed_idf() {
        let vectorizer = TfidfVectorizer::fit(&["bébé dort", "bébé mange", "maman mange"]);
        assert!((vectorizer.idf("bébé").unwrap() - (4.0f64 / 3.0).ln() - 1.0).abs() < EPS);
        assert!((vectorizer.idf("dort").unwrap() - 2.0f64.ln() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let vectorizer = TfidfVectorizer::fit(&["bébé dort bien", "maman mange"]);
        let vector = vectorizer.transform("bébé dort dort");
        let norm: f64 = vector.entries().iter().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < EPS);
    }

    #[test]
    fn test_unknown_terms_give_empty_vector() {
        let vectorizer = TfidfVectorizer::fit(&["bébé dort"]);
        let vector = vectorizer.transform("quantum blockchain");
        assert!(vector.is_empty());
        assert_eq!(vector.cosine(&vectorizer.transform("bébé")), 0.0);
    }

    #[test]
    fn test_identical_documents_have_cosine_one() {
        let vectorizer = TfidfVectorizer::fit(&["visite prénatale", "vaccin enfant"]);
        let a = vectorizer.transform("visite prénatale");
        let b = vectorizer.transform("prénatale visite");
        assert!((a.cosine(&b) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_disjoint_documents_have_cosine_zero() {
        let vectorizer = TfidfVectorizer::fit(&["visite prénatale", "vaccin enfant"]);
        let a = vectorizer.transform("visite");
        let b = vectorizer.transform("vaccin");
        assert_eq!(a.cosine(&b), 0.0);
    }
}
