use std::sync::Arc;

use tracing::{info, warn};

use quiz_core::model::{QuestionBank, QuestionId};
use quiz_core::{Clock, Language};
use storage::ProgressStore;

use crate::error::{ExportError, SessionError};
use crate::export::{ExportArtifact, ExportFormat, export_progress};
use crate::identity::Identity;
use crate::session::{AnswerFeedback, OpenOutcome, QuizSession};

/// Two-step confirmation for the destructive reset action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetConfirmation {
    Confirmed,
    Declined,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates sessions against the progress store.
///
/// The session itself is pure in-memory state; this layer decides when to
/// load, persist, and reset, and it is the only place that knows about the
/// persistence exemption.
#[derive(Clone)]
pub struct QuizService {
    store: ProgressStore,
    clock: Clock,
}

impl QuizService {
    #[must_use]
    pub fn new(store: ProgressStore, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Starts a session for an authenticated user, resuming stored progress.
    /// Exempt users always start clean; their history is never read.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the backend cannot be read.
    pub async fn start_session(
        &self,
        identity: Identity,
        bank: Arc<QuestionBank>,
        language: Language,
    ) -> Result<QuizSession, SessionError> {
        let progress = if identity.persistence_exempt {
            quiz_core::model::ProgressRecord::empty()
        } else {
            self.store.load(&identity.user).await?
        };

        info!(user = %identity.user, answered = progress.answered_ids().len(), "session started");
        Ok(QuizSession::new(
            identity.user,
            identity.persistence_exempt,
            language,
            bank,
            progress,
        ))
    }

    /// Opens a slot and persists immediately when the open consumed a trap,
    /// so a closed browser cannot un-spring it.
    pub async fn open_question(&self, session: &mut QuizSession, id: QuestionId) -> OpenOutcome {
        let outcome = session.open_question(id);
        if outcome.trap_consumed {
            self.persist(session).await;
        }
        outcome
    }

    /// Submits an answer for the open question and persists the outcome.
    ///
    /// # Errors
    ///
    /// Propagates the session's answering errors. A persistence failure is
    /// logged and swallowed; the in-memory session stays authoritative.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        selected_index: usize,
    ) -> Result<AnswerFeedback, SessionError> {
        let feedback = session.submit_answer(selected_index, self.clock.now())?;
        self.persist(session).await;
        Ok(feedback)
    }

    /// Erases the user's stored history and clears the live session.
    /// Returns whether anything was actually reset: a declined confirmation
    /// and an exempt user are both no-ops.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the backend delete fails.
    pub async fn reset_progress(
        &self,
        session: &mut QuizSession,
        confirmation: ResetConfirmation,
    ) -> Result<bool, SessionError> {
        if confirmation == ResetConfirmation::Declined || session.persistence_exempt() {
            return Ok(false);
        }

        self.store.reset(session.user()).await?;
        session.progress_mut().clear();
        session.return_to_menu();
        info!(user = %session.user(), "progress reset");
        Ok(true)
    }

    /// Builds a download artifact of the session's current progress.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` when serialization fails.
    pub fn export(
        &self,
        session: &QuizSession,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        export_progress(session.user(), session.progress(), self.clock.now(), format)
    }

    /// Best-effort write-through. Exempt users are never written, and a
    /// failed write only logs: losing a save must not interrupt the quiz.
    async fn persist(&self, session: &QuizSession) {
        if session.persistence_exempt() {
            return;
        }
        if let Err(err) = self.store.save(session.user(), session.progress()).await {
            warn!(user = %session.user(), %err, "failed to persist progress");
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
