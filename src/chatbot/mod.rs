//! Intent-matching chatbot
//!
//! The engine is built once from a corpus and shared read-only. It holds no
//! conversation state: callers pass the current [`DialogueState`] with each
//! utterance and store the state returned in the [`BotReply`].

pub mod calculators;
pub mod corpus;
pub mod dialogue;
pub mod matcher;
pub mod preprocess;
pub mod vectorizer;

pub use calculators::{
    INVALID_DATE_MESSAGE, generate_pregnancy_calendar, generate_vaccination_calendar,
};
pub use corpus::{Corpus, Intent};
pub use dialogue::{BIRTH_DATE_TAG, DUE_DATE_TAG, DialogueState};
pub use matcher::{DEFAULT_SIMILARITY_THRESHOLD, IntentMatcher, MatchOutcome};

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::config::ChatbotConfig;
use crate::error::Result;

/// Reply when no intent matches confidently.
pub const FALLBACK_MESSAGE: &str = "Je peux vous aider sur la grossesse 🤰, le bébé 👶, les visites prénatales, l’alimentation 🍎 ou la vaccination 💉. Que souhaitez-vous savoir ?";

/// How a reply was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyKind {
    Intent { tag: String, score: f64 },
    Fallback { best_score: f64 },
    PregnancyCalendar,
    VaccinationCalendar,
}

/// Reply text together with the state for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub struct BotReply {
    pub text: String,
    pub state: DialogueState,
    pub kind: ReplyKind,
}

impl BotReply {
    pub fn intent(&self) -> Option<&str> {
        match &self.kind {
            ReplyKind::Intent { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Similarity score of the turn, when the matcher ran.
    pub fn confidence(&self) -> Option<f64> {
        match &self.kind {
            ReplyKind::Intent { score, .. } => Some(*score),
            ReplyKind::Fallback { best_score } => Some(*best_score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chatbot {
    corpus: Corpus,
    matcher: IntentMatcher,
}

impl Chatbot {
    pub fn from_corpus(corpus: Corpus, threshold: f64) -> Self {
        let matcher = IntentMatcher::fit(&corpus, threshold);
        Self { corpus, matcher }
    }

    /// Load the corpus named in the configuration and fit the matcher.
    pub fn load(config: &ChatbotConfig) -> Result<Self> {
        let corpus = Corpus::load(&config.corpus_path)?;
        let chatbot = Self::from_corpus(corpus, config.similarity_threshold);
        info!(
            "Chatbot ready: {} intents, threshold {}",
            chatbot.corpus.intent_count(),
            chatbot.matcher.threshold()
        );
        Ok(chatbot)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub fn respond(&self, utterance: &str, state: DialogueState, today: NaiveDate) -> BotReply {
        self.respond_with_rng(utterance, state, today, &mut rand::rng())
    }

    pub fn respond_with_rng<R: Rng + ?Sized>(
        &self,
        utterance: &str,
        state: DialogueState,
        today: NaiveDate,
        rng: &mut R,
    ) -> BotReply {
        match state {
            DialogueState::AwaitingBirthDate => {
                return BotReply {
                    text: generate_vaccination_calendar(utterance),
                    state: DialogueState::Normal,
                    kind: ReplyKind::VaccinationCalendar,
                };
            }
            DialogueState::AwaitingDueDate => {
                return BotReply {
                    text: generate_pregnancy_calendar(utterance, today),
                    state: DialogueState::Normal,
                    kind: ReplyKind::PregnancyCalendar,
                };
            }
            DialogueState::Normal => {}
        }

        match self.matcher.match_intent(utterance) {
            MatchOutcome::Matched { tag, score, .. } => {
                debug!("Matched intent {} with score {:.3}", tag, score);
                let text = self
                    .corpus
                    .responses(&tag)
                    .and_then(|responses| responses.choose(rng))
                    .cloned()
                    .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
                BotReply {
                    text,
                    state: DialogueState::after_intent(&tag),
                    kind: ReplyKind::Intent { tag, score },
                }
            }
            MatchOutcome::Fallback { best_score } => {
                debug!("No confident intent, best score {:.3}", best_score);
                BotReply {
                    text: FALLBACK_MESSAGE.to_string(),
                    state: DialogueState::Normal,
                    kind: ReplyKind::Fallback { best_score },
                }
            }
        }
    }
}
