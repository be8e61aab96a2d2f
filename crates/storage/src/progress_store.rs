use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use quiz_core::model::{AnswerRecord, ProgressRecord, QuestionId, UserId};

use crate::repository::{KeyValueStore, StorageError};

const PROGRESS_NAMESPACE: &str = "quizProgress";
const RESULTS_NAMESPACE: &str = "quizResults";

fn progress_key(user: &UserId) -> String {
    format!("{PROGRESS_NAMESPACE}:{user}")
}

fn results_key(user: &UserId) -> String {
    format!("{RESULTS_NAMESPACE}:{user}")
}

/// Per-user progress persistence over a [`KeyValueStore`].
///
/// Each user owns two keys: `quizProgress:<user>` holds the sorted answered-id
/// array, `quizResults:<user>` the id-keyed result log. Both are JSON strings,
/// and each decodes independently: a corrupt value means "no history" for that
/// key, never a failure.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load a user's progress record. Missing or unparseable values yield an
    /// empty record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself cannot be read.
    pub async fn load(&self, user: &UserId) -> Result<ProgressRecord, StorageError> {
        let answered_ids = match self.kv.get(&progress_key(user)).await? {
            Some(raw) => decode_answered_ids(user, &raw),
            None => Vec::new(),
        };
        let results = match self.kv.get(&results_key(user)).await? {
            Some(raw) => decode_results(user, &raw),
            None => BTreeMap::new(),
        };
        Ok(ProgressRecord::from_parts(answered_ids, results))
    }

    /// Persist a user's progress record under both keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or either write fails.
    pub async fn save(&self, user: &UserId, record: &ProgressRecord) -> Result<(), StorageError> {
        let ids = serde_json::to_string(record.answered_ids())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let results = serde_json::to_string(record.results())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.kv.put(&progress_key(user), &ids).await?;
        self.kv.put(&results_key(user), &results).await?;
        Ok(())
    }

    /// Remove a user's progress and result log. Other users' keys are untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either delete fails.
    pub async fn reset(&self, user: &UserId) -> Result<(), StorageError> {
        self.kv.remove(&progress_key(user)).await?;
        self.kv.remove(&results_key(user)).await?;
        Ok(())
    }
}

fn decode_answered_ids(user: &UserId, raw: &str) -> Vec<QuestionId> {
    match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(err) => {
            warn!(user = %user, %err, "corrupt answered-id list, treating as empty");
            Vec::new()
        }
    }
}

fn decode_results(user: &UserId, raw: &str) -> BTreeMap<QuestionId, AnswerRecord> {
    match serde_json::from_str(raw) {
        Ok(results) => results,
        Err(err) => {
            warn!(user = %user, %err, "corrupt result log, treating as empty");
            BTreeMap::new()
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use quiz_core::time::fixed_now;

    fn store() -> (ProgressStore, InMemoryStore) {
        let kv = InMemoryStore::new();
        (ProgressStore::new(Arc::new(kv.clone())), kv)
    }

    fn record_for(id: u32, correct: bool) -> (QuestionId, AnswerRecord) {
        (
            QuestionId::new(id),
            AnswerRecord {
                is_correct: correct,
                selected_text: "B".into(),
                selected_index: 1,
                correct_text: "B".into(),
                correct_index: 1,
                timestamp: fixed_now(),
            },
        )
    }

    #[tokio::test]
    async fn load_on_missing_storage_is_empty() {
        let (progress, _) = store();
        let record = progress.load(&UserId::new("alice")).await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (store, _) = store();
        let alice = UserId::new("alice");

        let mut record = ProgressRecord::empty();
        record.mark_answered(QuestionId::new(5));
        record.mark_answered(QuestionId::new(3));
        let (id, entry) = record_for(3, true);
        record.record_result(id, entry);

        store.save(&alice, &record).await.unwrap();
        let loaded = store.load(&alice).await.unwrap();

        assert_eq!(loaded, record);
        assert_eq!(
            loaded.answered_ids(),
            [QuestionId::new(3), QuestionId::new(5)]
        );
    }

    #[tokio::test]
    async fn corrupt_progress_value_loads_as_empty() {
        let (store, kv) = store();
        let bob = UserId::new("bob");
        kv.put("quizProgress:bob", "{not json").await.unwrap();
        kv.put("quizResults:bob", "also not json").await.unwrap();

        let record = store.load(&bob).await.unwrap();
        assert!(record.answered_ids().is_empty());
        assert!(record.results().is_empty());
    }

    #[tokio::test]
    async fn corrupt_keys_decode_independently() {
        let (store, kv) = store();
        let bob = UserId::new("bob");
        kv.put("quizProgress:bob", "[1,4]").await.unwrap();
        kv.put("quizResults:bob", "???").await.unwrap();

        let record = store.load(&bob).await.unwrap();
        assert_eq!(
            record.answered_ids(),
            [QuestionId::new(1), QuestionId::new(4)]
        );
        assert!(record.results().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_only_the_given_user() {
        let (store, _) = store();
        let alice = UserId::new("alice");
        let carol = UserId::new("carol");

        let mut record = ProgressRecord::empty();
        let (id, entry) = record_for(7, false);
        record.record_result(id, entry);

        store.save(&alice, &record).await.unwrap();
        store.save(&carol, &record).await.unwrap();
        store.reset(&alice).await.unwrap();

        assert!(store.load(&alice).await.unwrap().is_empty());
        assert_eq!(store.load(&carol).await.unwrap(), record);
    }

    #[tokio::test]
    async fn result_log_keys_are_numeric_strings_on_the_wire() {
        let (store, kv) = store();
        let alice = UserId::new("alice");

        let mut record = ProgressRecord::empty();
        let (id, entry) = record_for(12, true);
        record.record_result(id, entry);
        store.save(&alice, &record).await.unwrap();

        let raw = kv.get("quizResults:alice").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("12").is_some());
    }
}
