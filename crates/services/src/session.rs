use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::Language;
use quiz_core::model::{
    AnswerRecord, MenuSlot, ProgressRecord, Question, QuestionBank, QuestionBody, QuestionId,
    SLOT_COUNT, SlotState, UserId,
};

use crate::error::SessionError;
use crate::evaluator::{Evaluation, evaluate};
use crate::view::{ViewDescriptor, feedback_title, question_heading};

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Which screen the session is on. Only two places exist: the menu, or one
/// open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewState {
    Menu,
    Question(QuestionId),
}

/// Result of opening a slot from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    pub view: ViewDescriptor,
    /// Set when this open consumed a trap slot for the first time. The
    /// caller is expected to persist progress when it sees this.
    pub trap_consumed: bool,
}

/// Feedback returned after answering a standard question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    /// Localized verdict title, e.g. `Correto!`.
    pub title: String,
    pub evaluation: Evaluation,
}

/// One authenticated user's pass through the quiz.
///
/// The session owns the in-memory progress and drives the menu/question state
/// machine; persistence is layered on top by the service. All text leaving
/// the session is already resolved into the session language.
#[derive(Debug, Clone)]
pub struct QuizSession {
    user: UserId,
    persistence_exempt: bool,
    language: Language,
    bank: Arc<QuestionBank>,
    view: ViewState,
    progress: ProgressRecord,
}

impl QuizSession {
    /// Starts a session on the menu. Progress entries whose id has no backing
    /// question in this bank are dropped up front, so the menu never shows a
    /// completed-but-missing slot.
    #[must_use]
    pub fn new(
        user: UserId,
        persistence_exempt: bool,
        language: Language,
        bank: Arc<QuestionBank>,
        mut progress: ProgressRecord,
    ) -> Self {
        progress.retain_ids(|id| bank.contains(id));
        Self {
            user,
            persistence_exempt,
            language,
            bank,
            view: ViewState::Menu,
            progress,
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn persistence_exempt(&self) -> bool {
        self.persistence_exempt
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressRecord {
        &mut self.progress
    }

    /// Switches the display language. Idempotent; the current screen is
    /// simply re-described in the new language on the next render.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Describes the current screen, render-ready.
    #[must_use]
    pub fn describe(&self) -> ViewDescriptor {
        match self.view {
            ViewState::Menu => ViewDescriptor::Menu {
                slots: self.menu_slots(),
            },
            ViewState::Question(id) => match self.bank.get(id) {
                Some(question) => self.describe_question(question),
                // The bank is immutable, so this only happens if state was
                // forged; degrade to the menu rather than panic.
                None => ViewDescriptor::Menu {
                    slots: self.menu_slots(),
                },
            },
        }
    }

    /// The full 450-slot menu in id order.
    ///
    /// Exempt users always see authored slots as open; completion marks never
    /// lock them out of a slot.
    #[must_use]
    pub fn menu_slots(&self) -> Vec<MenuSlot> {
        (1..=SLOT_COUNT as u32)
            .map(QuestionId::new)
            .map(|id| {
                let state = if !self.bank.contains(id) {
                    SlotState::Missing
                } else if !self.persistence_exempt && self.progress.is_answered(id) {
                    SlotState::Completed
                } else {
                    SlotState::Open
                };
                MenuSlot { id, state }
            })
            .collect()
    }

    /// Opens a slot. An id with no backing question is ignored and the menu
    /// stays up. Opening a trap consumes its slot immediately, before any
    /// interaction.
    pub fn open_question(&mut self, id: QuestionId) -> OpenOutcome {
        let Some(question) = self.bank.get(id).cloned() else {
            self.view = ViewState::Menu;
            return OpenOutcome {
                view: self.describe(),
                trap_consumed: false,
            };
        };

        let trap_consumed = question.is_trap() && self.progress.mark_answered(id);
        self.view = ViewState::Question(id);
        OpenOutcome {
            view: self.describe_question(&question),
            trap_consumed,
        }
    }

    /// Leaves the current question without touching progress.
    pub fn return_to_menu(&mut self) {
        self.view = ViewState::Menu;
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Evaluates the selected option for the open question and records the
    /// outcome. Re-answering overwrites the earlier result for the same id.
    ///
    /// # Errors
    ///
    /// `SessionError::NoQuestionOpen` when called from the menu,
    /// `SessionError::TrapTakesNoAnswer` for traps, and
    /// `SessionError::Evaluation` when the index addresses no option.
    pub fn submit_answer(
        &mut self,
        selected_index: usize,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerFeedback, SessionError> {
        let ViewState::Question(id) = self.view else {
            return Err(SessionError::NoQuestionOpen);
        };
        let Some(question) = self.bank.get(id) else {
            return Err(SessionError::NoQuestionOpen);
        };
        let QuestionBody::Standard(standard) = question.body() else {
            return Err(SessionError::TrapTakesNoAnswer(id));
        };

        let evaluation = evaluate(standard, self.language, selected_index)?;
        self.progress.record_result(
            id,
            AnswerRecord {
                is_correct: evaluation.is_correct,
                selected_text: evaluation.selected_text.clone(),
                selected_index: evaluation.selected_index,
                correct_text: evaluation.correct_text.clone(),
                correct_index: evaluation.correct_index,
                timestamp: answered_at,
            },
        );

        Ok(AnswerFeedback {
            question_id: id,
            title: feedback_title(self.language, evaluation.is_correct).to_owned(),
            evaluation,
        })
    }

    //
    // ─── RENDERING ─────────────────────────────────────────────────────────────
    //

    fn describe_question(&self, question: &Question) -> ViewDescriptor {
        let id = question.id();
        let heading = question_heading(self.language, id);
        match question.body() {
            QuestionBody::Standard(standard) => ViewDescriptor::Standard {
                id,
                heading,
                prompt: standard.prompt().resolve(self.language).to_owned(),
                options: standard.options().resolve(self.language).to_vec(),
                answered: self.progress.is_answered(id),
            },
            QuestionBody::Trap(trap) => ViewDescriptor::Trap {
                id,
                heading,
                message: trap.message_in(self.language).to_owned(),
                image: trap.image().map(str::to_owned),
            },
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::lang::{LocalizedList, LocalizedText};
    use quiz_core::model::{StandardQuestion, TrapQuestion};
    use quiz_core::time::fixed_now;

    fn standard(id: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionBody::Standard(
                StandardQuestion::new(
                    LocalizedText::bilingual("Pergunta?", "Question?"),
                    LocalizedList::bilingual(
                        vec!["A".into(), "B".into(), "C".into()],
                        vec!["A".into(), "B".into(), "C".into()],
                    ),
                    LocalizedList::bilingual(
                        vec!["rA".into(), "rB".into(), "rC".into()],
                        vec!["rA".into(), "rB".into(), "rC".into()],
                    ),
                    1,
                )
                .unwrap(),
            ),
        )
    }

    fn trap(id: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionBody::Trap(TrapQuestion::new(
                LocalizedText::bilingual("Caiu!", "Caught!"),
                None,
            )),
        )
    }

    fn session(questions: Vec<Question>) -> QuizSession {
        QuizSession::new(
            UserId::from("maria"),
            false,
            Language::Pt,
            Arc::new(QuestionBank::from_questions(questions)),
            ProgressRecord::empty(),
        )
    }

    #[test]
    fn menu_reflects_bank_and_progress() {
        let mut s = session(vec![standard(1), trap(2)]);
        s.open_question(QuestionId::new(2));

        let slots = s.menu_slots();
        assert_eq!(slots.len(), SLOT_COUNT);
        assert_eq!(slots[0].state, SlotState::Open);
        assert_eq!(slots[1].state, SlotState::Completed);
        assert_eq!(slots[2].state, SlotState::Missing);
    }

    #[test]
    fn opening_unknown_slot_stays_on_menu() {
        let mut s = session(vec![standard(1)]);
        let outcome = s.open_question(QuestionId::new(300));
        assert!(matches!(outcome.view, ViewDescriptor::Menu { .. }));
        assert!(!outcome.trap_consumed);
    }

    #[test]
    fn trap_is_consumed_on_first_open_only() {
        let mut s = session(vec![trap(5)]);

        let first = s.open_question(QuestionId::new(5));
        assert!(first.trap_consumed);
        assert!(matches!(first.view, ViewDescriptor::Trap { .. }));

        s.return_to_menu();
        let second = s.open_question(QuestionId::new(5));
        assert!(!second.trap_consumed);
    }

    #[test]
    fn opening_a_standard_question_leaves_it_unanswered() {
        let mut s = session(vec![standard(7)]);

        let outcome = s.open_question(QuestionId::new(7));
        assert!(matches!(outcome.view, ViewDescriptor::Standard { .. }));
        assert!(!outcome.trap_consumed);
        s.return_to_menu();

        assert!(!s.progress().is_answered(QuestionId::new(7)));
        assert_eq!(s.menu_slots()[6].state, SlotState::Open);
    }

    #[test]
    fn trap_rejects_answers() {
        let mut s = session(vec![trap(5)]);
        s.open_question(QuestionId::new(5));
        let err = s.submit_answer(0, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::TrapTakesNoAnswer(id) if id.value() == 5));
    }

    #[test]
    fn answering_records_result_and_marks_slot() {
        let mut s = session(vec![standard(7)]);
        s.open_question(QuestionId::new(7));

        let feedback = s.submit_answer(1, fixed_now()).unwrap();
        assert!(feedback.evaluation.is_correct);
        assert_eq!(feedback.title, "Correto!");
        assert_eq!(feedback.evaluation.rationale, "rB");

        assert!(s.progress().is_answered(QuestionId::new(7)));
        let record = &s.progress().results()[&QuestionId::new(7)];
        assert_eq!(record.selected_index, 1);
        assert!(record.is_correct);
    }

    #[test]
    fn reanswering_overwrites_without_duplicating() {
        let mut s = session(vec![standard(7)]);
        s.open_question(QuestionId::new(7));
        s.submit_answer(0, fixed_now()).unwrap();
        s.submit_answer(1, fixed_now()).unwrap();

        assert_eq!(s.progress().answered_ids().len(), 1);
        assert!(s.progress().results()[&QuestionId::new(7)].is_correct);
    }

    #[test]
    fn answer_from_menu_is_rejected() {
        let mut s = session(vec![standard(7)]);
        let err = s.submit_answer(0, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NoQuestionOpen));
    }

    #[test]
    fn language_switch_rerenders_the_open_question() {
        let mut s = session(vec![standard(7)]);
        s.open_question(QuestionId::new(7));

        let ViewDescriptor::Standard { heading, .. } = s.describe() else {
            panic!("expected a standard question view");
        };
        assert_eq!(heading, "Pergunta 7");

        s.set_language(Language::En);
        let ViewDescriptor::Standard { heading, .. } = s.describe() else {
            panic!("expected a standard question view");
        };
        assert_eq!(heading, "Question 7");
    }

    #[test]
    fn stale_progress_ids_are_dropped_on_start() {
        let mut progress = ProgressRecord::empty();
        progress.mark_answered(QuestionId::new(1));
        progress.mark_answered(QuestionId::new(99));

        let s = QuizSession::new(
            UserId::from("maria"),
            false,
            Language::Pt,
            Arc::new(QuestionBank::from_questions(vec![standard(1)])),
            progress,
        );
        assert_eq!(s.progress().answered_ids(), [QuestionId::new(1)]);
    }

    #[test]
    fn exempt_user_keeps_slots_open() {
        let mut s = QuizSession::new(
            UserId::from("bombeiro"),
            true,
            Language::Pt,
            Arc::new(QuestionBank::from_questions(vec![trap(2)])),
            ProgressRecord::empty(),
        );
        s.open_question(QuestionId::new(2));

        let slots = s.menu_slots();
        assert_eq!(slots[1].state, SlotState::Open);
    }
}
