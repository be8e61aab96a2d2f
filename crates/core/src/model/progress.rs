use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── RESULT LOG ENTRIES ────────────────────────────────────────────────────────
//

/// One evaluated answer, as persisted in the per-user result log.
///
/// Field names on the wire match the original export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    #[serde(rename = "correct")]
    pub is_correct: bool,
    pub selected_text: String,
    pub selected_index: usize,
    pub correct_text: String,
    pub correct_index: usize,
    pub timestamp: DateTime<Utc>,
}

//
// ─── PROGRESS RECORDS ──────────────────────────────────────────────────────────
//

/// Durable per-user progress: which slots are done, and how each standard
/// question was answered.
///
/// Invariant: `answered_ids` is sorted ascending and free of duplicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressRecord {
    answered_ids: Vec<QuestionId>,
    results: BTreeMap<QuestionId, AnswerRecord>,
}

impl ProgressRecord {
    /// A record with no history, the state of a fresh or reset user.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rehydrates a record from persisted parts, restoring the sort/dedup
    /// invariant on the id list.
    #[must_use]
    pub fn from_parts(
        mut answered_ids: Vec<QuestionId>,
        results: BTreeMap<QuestionId, AnswerRecord>,
    ) -> Self {
        answered_ids.sort_unstable();
        answered_ids.dedup();
        Self {
            answered_ids,
            results,
        }
    }

    #[must_use]
    pub fn answered_ids(&self) -> &[QuestionId] {
        &self.answered_ids
    }

    #[must_use]
    pub fn results(&self) -> &BTreeMap<QuestionId, AnswerRecord> {
        &self.results
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answered_ids.is_empty() && self.results.is_empty()
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.answered_ids.binary_search(&id).is_ok()
    }

    /// Marks a slot completed. Returns `false` when it already was.
    pub fn mark_answered(&mut self, id: QuestionId) -> bool {
        match self.answered_ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.answered_ids.insert(pos, id);
                true
            }
        }
    }

    /// Records an evaluated answer, overwriting any earlier entry for the
    /// same id, and marks the slot completed.
    pub fn record_result(&mut self, id: QuestionId, record: AnswerRecord) {
        self.mark_answered(id);
        self.results.insert(id, record);
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.answered_ids.clear();
        self.results.clear();
    }

    /// Keeps only ids that still have a backing question, per the provided
    /// predicate. Used when resuming against a newer bank.
    pub fn retain_ids(&mut self, mut backed: impl FnMut(QuestionId) -> bool) {
        self.answered_ids.retain(|id| backed(*id));
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
