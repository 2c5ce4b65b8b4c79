//! Text preprocessing
//!
//! Lowercases, tokenizes and lemmatizes utterances. The same pipeline runs
//! over corpus patterns at fit time and over user input at query time, so
//! the lemmatizer only has to be consistent, not linguistically complete.

use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Irregular plurals that the suffix rules would mangle.
const IRREGULAR: &[(&str, &str)] = &[
    ("yeux", "œil"),
    ("travaux", "travail"),
    ("vitraux", "vitrail"),
    ("baux", "bail"),
    ("jeux", "jeu"),
    ("cheveux", "cheveu"),
    ("genoux", "genou"),
    ("bijoux", "bijou"),
    ("poux", "pou"),
];

/// Words ending in `s` or `x` that are not plurals.
const INVARIANT: &[&str] = &[
    "dans", "sans", "sous", "vers", "chez", "alors", "depuis", "toujours", "moins", "jamais",
    "temps", "corps", "poids", "fois", "mois", "pays", "repas", "avis", "gras", "prix", "voix",
    "deux", "mieux", "vieux", "ceux", "heureux", "nerveux", "dangereux", "faux", "doux", "toux",
];

/// Reduce a lowercase token to its lemma.
pub fn lemmatize(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(plural, _)| *plural == token) {
        return (*lemma).to_string();
    }
    if INVARIANT.contains(&token) {
        return token.to_string();
    }

    let len = token.chars().count();

    if len > 4 {
        if let Some(stem) = token.strip_suffix("eaux") {
            return format!("{stem}eau");
        }
        if let Some(stem) = token.strip_suffix("aux") {
            return format!("{stem}al");
        }
    }

    if len > 3 {
        let keeps_s = ["ss", "us", "is", "os", "as", "ès", "ys"]
            .iter()
            .any(|suffix| token.ends_with(suffix));
        if !keeps_s {
            if let Some(stem) = token.strip_suffix('s') {
                return stem.to_string();
            }
        }
    }

    token.to_string()
}

/// Split an utterance into lowercase lemmatized tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| lemmatize(m.as_str()))
        .collect()
}

/// Normalize an utterance into space-separated lemmas.
///
/// Empty input yields an empty string.
pub fn preprocess(text: &str) -> String {
    tokenize(text).join(" ")
}
