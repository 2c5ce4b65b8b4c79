//! Nearest-pattern intent matcher

use serde::Serialize;

use super::corpus::Corpus;
use super::preprocess::preprocess;
use super::vectorizer::{SparseVector, TfidfVectorizer};

/// Similarity a match must strictly exceed to be trusted.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.20;

/// Result of matching one utterance against the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MatchOutcome {
    /// Best pattern scored above the threshold.
    Matched {
        tag: String,
        score: f64,
        pattern_index: usize,
    },
    /// No pattern scored above the threshold.
    Fallback { best_score: f64 },
}

impl MatchOutcome {
    pub fn tag(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { tag, .. } => Some(tag),
            MatchOutcome::Fallback { .. } => None,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            MatchOutcome::Matched { score, .. } => *score,
            MatchOutcome::Fallback { best_score } => *best_score,
        }
    }
}

/// TF-IDF space fitted over every corpus pattern.
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    vectorizer: TfidfVectorizer,
    pattern_vectors: Vec<SparseVector>,
    pattern_tags: Vec<String>,
    threshold: f64,
}

impl IntentMatcher {
    pub fn fit(corpus: &Corpus, threshold: f64) -> Self {
        let processed: Vec<String> = corpus.patterns().iter().map(|p| preprocess(p)).collect();
        let vectorizer = TfidfVectorizer::fit(&processed);
        let pattern_vectors = processed.iter().map(|p| vectorizer.transform(p)).collect();
        let pattern_tags = (0..processed.len())
            .filter_map(|i| corpus.tag_of(i).map(str::to_string))
            .collect();

        Self {
            vectorizer,
            pattern_vectors,
            pattern_tags,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Highest similarity and its pattern index.
    ///
    /// Scans in corpus order with a strict comparison, so the first index
    /// wins ties.
    pub fn best_pattern(&self, utterance: &str) -> Option<(usize, f64)> {
        let query = self.vectorizer.transform(&preprocess(utterance));
        let mut best: Option<(usize, f64)> = None;
        for (index, pattern) in self.pattern_vectors.iter().enumerate() {
            let score = query.cosine(pattern);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best
    }

    pub fn match_intent(&self, utterance: &str) -> MatchOutcome {
        match self.best_pattern(utterance) {
            Some((index, score)) if score > self.threshold => MatchOutcome::Matched {
                tag: self.pattern_tags[index].clone(),
                score,
                pattern_index: index,
            },
            Some((_, score)) => MatchOutcome::Fallback { best_score: score },
            None => MatchOutcome::Fallback { best_score: 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::corpus::Intent;

    fn intent(tag: &str, patterns: &[&str]) -> Intent {
        Intent {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: vec![format!("réponse {tag}")],
        }
    }

    fn matcher() -> IntentMatcher {
        let corpus = Corpus::from_intents(vec![
            intent("salutation", &["bonjour", "salut comment ça va"]),
            intent("vaccination", &["quels vaccins pour mon bébé", "calendrier des vaccins"]),
            intent("alimentation", &["que manger pendant la grossesse"]),
        ]);
        IntentMatcher::fit(&corpus, DEFAULT_SIMILARITY_THRESHOLD)
    }

    #[test]
    fn test_exact_pattern_matches_its_intent() {
        let outcome = matcher().match_intent("Quels vaccins pour mon bébé ?");
        assert_eq!(outcome.tag(), Some("vaccination"));
        assert!((outcome.score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plural_query_matches_singular_pattern() {
        let outcome = matcher().match_intent("Bonjours");
        assert_eq!(outcome.tag(), Some("salutation"));
    }

    #[test]
    fn test_unknown_words_fall_back() {
        let outcome = matcher().match_intent("xylophone quantique");
        assert_eq!(outcome, MatchOutcome::Fallback { best_score: 0.0 });
    }

    #[test]
    fn test_empty_corpus_falls_back() {
        let matcher = IntentMatcher::fit(&Corpus::default(), DEFAULT_SIMILARITY_THRESHOLD);
        assert!(matcher.best_pattern("bonjour").is_none());
        assert_eq!(matcher.match_intent("bonjour").tag(), None);
    }

    #[test]
    fn test_score_equal_to_threshold_falls_back() {
        let corpus = Corpus::from_intents(vec![intent("a", &["bonjour"])]);
        let matcher = IntentMatcher::fit(&corpus, 1.0);
        let outcome = matcher.match_intent("bonjour");
        assert!(matches!(outcome, MatchOutcome::Fallback { .. }));
    }

    #[test]
    fn test_first_index_wins_ties() {
        let corpus = Corpus::from_intents(vec![
            intent("premier", &["grossesse"]),
            intent("second", &["grossesse"]),
        ]);
        let matcher = IntentMatcher::fit(&corpus, DEFAULT_SIMILARITY_THRESHOLD);
        let outcome = matcher.match_intent("grossesse");
        assert_eq!(outcome.tag(), Some("premier"));
        assert!(matches!(
            outcome,
            MatchOutcome::Matched { pattern_index: 0, .. }
        ));
    }

    #[test]
    fn test_all_zero_scores_pick_first_pattern() {
        let (index, score) = matcher().best_pattern("zzz").unwrap();
        assert_eq!(index, 0);
        assert_eq!(score, 0.0);
    }
}
