//! Per-conversation dialogue state

use serde::{Deserialize, Serialize};

/// Tag whose match asks the user for a due date.
pub const DUE_DATE_TAG: &str = "Savoir_approximation_grossesse";

/// Tag whose match asks the user for a child's birth date.
pub const BIRTH_DATE_TAG: &str = "Approximation_calendrier_vaccination_jeune_enfant";

/// What the next user turn will be interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Next turn goes through the intent matcher.
    #[default]
    Normal,
    /// Next turn is read as a due date for the pregnancy calendar.
    AwaitingDueDate,
    /// Next turn is read as a birth date for the vaccination calendar.
    AwaitingBirthDate,
}

impl DialogueState {
    /// State entered after replying with the given intent.
    pub fn after_intent(tag: &str) -> Self {
        match tag {
            DUE_DATE_TAG => DialogueState::AwaitingDueDate,
            BIRTH_DATE_TAG => DialogueState::AwaitingBirthDate,
            _ => DialogueState::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_tags_enter_awaiting_states() {
        assert_eq!(
            DialogueState::after_intent(DUE_DATE_TAG),
            DialogueState::AwaitingDueDate
        );
        assert_eq!(
            DialogueState::after_intent(BIRTH_DATE_TAG),
            DialogueState::AwaitingBirthDate
        );
        assert_eq!(DialogueState::after_intent("salutation"), DialogueState::Normal);
    }

    #[test]
    fn test_serde_representation() {
        assert_eq!(
            serde_json::to_string(&DialogueState::AwaitingBirthDate).unwrap(),
            "\"awaiting_birth_date\""
        );
        assert_eq!(DialogueState::default(), DialogueState::Normal);
    }
}
