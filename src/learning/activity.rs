use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::RuleError;

/// Kind of exercise inside a lesson. The frontend picks a widget per kind;
/// the server only checks that the kind is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Warmup,
    VocabularyIntro,
    Flashcards,
    VocabMatch,
    FillBlanks,
    MultipleChoice,
    GrammarExplanation,
    GrammarSentences,
    Listening,
    Reading,
    Speaking,
    Writing,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::VocabularyIntro => "vocabulary_intro",
            Self::Flashcards => "flashcards",
            Self::VocabMatch => "vocab_match",
            Self::FillBlanks => "fill_blanks",
            Self::MultipleChoice => "multiple_choice",
            Self::GrammarExplanation => "grammar_explanation",
            Self::GrammarSentences => "grammar_sentences",
            Self::Listening => "listening",
            Self::Reading => "reading",
            Self::Speaking => "speaking",
            Self::Writing => "writing",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // serde already knows every spelling
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| RuleError::UnknownActivityType(s.to_string()))
    }
}
