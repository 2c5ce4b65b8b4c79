//! Intent corpus
//!
//! Loads `{ "intents": [ { "tag", "patterns", "responses" } ] }` documents.
//! Malformed entries are skipped with a warning rather than failing the load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// A labeled request category with example phrasings and candidate replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub tag: String,
    pub patterns: Vec<String>,
    pub responses: Vec<String>,
}

/// Validated corpus, flattened into parallel pattern/tag lists.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    patterns: Vec<String>,
    pattern_tags: Vec<String>,
    responses: HashMap<String, Vec<String>>,
}

impl Corpus {
    /// Build from already validated intents.
    pub fn from_intents(intents: Vec<Intent>) -> Self {
        let mut corpus = Self::default();
        for intent in intents {
            corpus.push(intent);
        }
        corpus
    }

    fn push(&mut self, intent: Intent) {
        // A repeated tag keeps the responses of its last entry.
        self.responses.insert(intent.tag.clone(), intent.responses);
        for pattern in intent.patterns {
            if pattern.trim().is_empty() {
                continue;
            }
            self.patterns.push(pattern);
            self.pattern_tags.push(intent.tag.clone());
        }
    }

    /// Parse a JSON corpus document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        let entries = match document.get("intents") {
            Some(Value::Array(entries)) => entries.as_slice(),
            Some(_) => {
                return Err(AppError::Corpus(
                    "\"intents\" must be an array".to_string(),
                ));
            }
            None => &[],
        };

        let mut corpus = Self::default();
        let mut skipped = 0usize;
        for (position, entry) in entries.iter().enumerate() {
            match parse_intent(entry) {
                Some(intent) => corpus.push(intent),
                None => {
                    skipped += 1;
                    warn!("Skipping malformed intent at position {}", position);
                }
            }
        }

        info!(
            "Corpus loaded: {} intents, {} patterns, {} skipped",
            corpus.responses.len(),
            corpus.patterns.len(),
            skipped
        );
        Ok(corpus)
    }

    /// Read and parse a corpus file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Corpus(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Tag of the pattern at `index`.
    pub fn tag_of(&self, index: usize) -> Option<&str> {
        self.pattern_tags.get(index).map(String::as_str)
    }

    pub fn responses(&self, tag: &str) -> Option<&[String]> {
        self.responses.get(tag).map(Vec::as_slice)
    }

    pub fn intent_count(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn parse_intent(entry: &Value) -> Option<Intent> {
    let tag = entry.get("tag")?.as_str()?.trim();
    if tag.is_empty() {
        return None;
    }

    let responses: Vec<String> = entry
        .get("responses")?
        .as_array()?
        .iter()
        .filter_map(|r| r.as_str().map(str::to_string))
        .collect();
    if responses.is_empty() {
        return None;
    }

    let patterns = match entry.get("patterns") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|p| p.as_str())
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
        Some(_) => return None,
    };

    Some(Intent {
        tag: tag.to_string(),
        patterns,
        responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_flattens_patterns() {
        let corpus = Corpus::from_json(
            &json!({
                "intents": [
                    {"tag": "salutation", "patterns": ["Bonjour", "Salut"], "responses": ["Bonjour !"]},
                    {"tag": "merci", "patterns": ["Merci"], "responses": ["Avec plaisir"]}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(corpus.patterns().len(), 3);
        assert_eq!(corpus.tag_of(1), Some("salutation"));
        assert_eq!(corpus.tag_of(2), Some("merci"));
        assert_eq!(corpus.intent_count(), 2);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let corpus = Corpus::from_json(
            &json!({
                "intents": [
                    {"patterns": ["sans tag"], "responses": ["x"]},
                    {"tag": "", "patterns": ["tag vide"], "responses": ["x"]},
                    {"tag": "sans_reponse", "patterns": ["a"], "responses": []},
                    {"tag": "patterns_invalides", "patterns": "pas une liste", "responses": ["x"]},
                    {"tag": "ok", "patterns": ["valide", 42, "   ", null], "responses": ["oui"]}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(corpus.patterns(), &["valide".to_string()]);
        assert_eq!(corpus.intent_count(), 1);
        assert!(corpus.responses("sans_reponse").is_none());
    }

    #[test]
    fn test_repeated_tag_keeps_last_responses() {
        let corpus = Corpus::from_json(
            &json!({
                "intents": [
                    {"tag": "t", "patterns": ["un"], "responses": ["premier"]},
                    {"tag": "t", "patterns": ["deux"], "responses": ["second"]}
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(corpus.patterns().len(), 2);
        assert_eq!(corpus.responses("t").unwrap(), &["second".to_string()]);
    }

    #[test]
    fn test_missing_intents_key_is_empty_corpus() {
        let corpus = Corpus::from_json("{}").unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Corpus::from_json("not json").is_err());
    }

    #[test]
    fn test_bundled_corpus_loads() {
        let corpus = Corpus::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/corpus.json")).unwrap();
        assert!(corpus.responses("Savoir_approximation_grossesse").is_some());
        assert!(
            corpus
                .responses("Approximation_calendrier_vaccination_jeune_enfant")
                .is_some()
        );
    }
}
