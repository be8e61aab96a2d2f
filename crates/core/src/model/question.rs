use thiserror::Error;

use crate::lang::{Language, LocalizedList, LocalizedText};
use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// A single authored question occupying one menu slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    body: QuestionBody,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, body: QuestionBody) -> Self {
        Self { id, body }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    /// True for the one-shot trap variant.
    #[must_use]
    pub fn is_trap(&self) -> bool {
        matches!(self.body, QuestionBody::Trap(_))
    }
}

/// The two question variants the bank can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBody {
    Standard(StandardQuestion),
    Trap(TrapQuestion),
}

//
// ─── STANDARD QUESTIONS ────────────────────────────────────────────────────────
//

/// A multiple-choice question with positionally paired rationales:
/// `rationales[i]` explains `options[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardQuestion {
    prompt: LocalizedText,
    options: LocalizedList,
    rationales: LocalizedList,
    correct_index: usize,
}

impl StandardQuestion {
    /// Builds a standard question, enforcing that `correct_index` addresses a
    /// valid option in every language variant present.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoOptions` if no option list is present, or
    /// `QuestionError::CorrectIndexOutOfRange` if any present list is too short.
    pub fn new(
        prompt: LocalizedText,
        options: LocalizedList,
        rationales: LocalizedList,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let lengths = options.lengths();
        if lengths.iter().all(|len| *len == 0) {
            return Err(QuestionError::NoOptions);
        }
        if let Some(len) = lengths.into_iter().find(|len| correct_index >= *len) {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                len,
            });
        }

        Ok(Self {
            prompt,
            options,
            rationales,
            correct_index,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &LocalizedText {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &LocalizedList {
        &self.options
    }

    #[must_use]
    pub fn rationales(&self) -> &LocalizedList {
        &self.rationales
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// The option text of the correct answer in `lang`, or empty if the
    /// resolved list is shorter than `correct_index`.
    #[must_use]
    pub fn correct_text(&self, lang: Language) -> &str {
        self.options
            .resolve(lang)
            .get(self.correct_index)
            .map_or("", String::as_str)
    }
}

//
// ─── TRAP QUESTIONS ────────────────────────────────────────────────────────────
//

const DEFAULT_TRAP_MESSAGE_PT: &str = "VOCÊ CAIU NO PHISHING! TENTE NOVAMENTE MAIS TARDE!";
const DEFAULT_TRAP_MESSAGE_EN: &str = "YOU FELL FOR PHISHING! TRY AGAIN LATER!";

/// A phishing-simulation question: no options, never correct or incorrect,
/// and its slot is consumed the moment it is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapQuestion {
    message: LocalizedText,
    image: Option<String>,
}

impl TrapQuestion {
    #[must_use]
    pub fn new(message: LocalizedText, image: Option<String>) -> Self {
        Self { message, image }
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// The trap message in `lang`; a blank message renders the stock
    /// phishing warning instead.
    #[must_use]
    pub fn message_in(&self, lang: Language) -> &str {
        let resolved = self.message.resolve(lang);
        if !resolved.trim().is_empty() {
            return resolved;
        }
        match lang {
            Language::Pt => DEFAULT_TRAP_MESSAGE_PT,
            Language::En => DEFAULT_TRAP_MESSAGE_EN,
        }
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("standard question carries no options in any language")]
    NoOptions,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
