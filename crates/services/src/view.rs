use quiz_core::Language;
use quiz_core::model::{MenuSlot, QuestionId};

//
// ─── VIEW DESCRIPTORS ──────────────────────────────────────────────────────────
//

/// Render-ready description of the current screen.
///
/// All text is already resolved into the session language; a front end only
/// lays it out. Switching language re-derives the descriptor from the same
/// session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewDescriptor {
    /// The 450-slot selection grid.
    Menu { slots: Vec<MenuSlot> },
    /// An open standard question.
    Standard {
        id: QuestionId,
        heading: String,
        prompt: String,
        options: Vec<String>,
        /// Whether this question was already answered before this visit.
        answered: bool,
    },
    /// An open trap. There is nothing to answer; only the warning shows.
    Trap {
        id: QuestionId,
        heading: String,
        message: String,
        image: Option<String>,
    },
}

/// Localized heading for an open question, e.g. `Pergunta 7` / `Question 7`.
#[must_use]
pub fn question_heading(lang: Language, id: QuestionId) -> String {
    match lang {
        Language::Pt => format!("Pergunta {id}"),
        Language::En => format!("Question {id}"),
    }
}

/// Localized title line for the answer verdict.
#[must_use]
pub fn feedback_title(lang: Language, is_correct: bool) -> &'static str {
    match (lang, is_correct) {
        (Language::Pt, true) => "Correto!",
        (Language::En, true) => "Correct!",
        (Language::Pt, false) => "Incorreto. Revise a justificativa:",
        (Language::En, false) => "Incorrect. Review the rationale:",
    }
}
