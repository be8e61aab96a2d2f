use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Number of addressable question slots; ids run `1..=SLOT_COUNT`.
pub const SLOT_COUNT: usize = 450;

/// The static, id-indexed question collection.
///
/// Loaded once at startup and immutable for the rest of the session. A slot
/// without a backing record is a valid state ("not yet authored").
#[derive(Debug, Clone)]
pub struct QuestionBank {
    slots: Vec<Option<Question>>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::empty()
    }
}

impl QuestionBank {
    /// A bank with every slot unauthored, the state after a failed load.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: vec![None; SLOT_COUNT],
        }
    }

    /// Indexes questions by id, discarding any whose id is outside
    /// `1..=SLOT_COUNT`. A duplicate id overwrites the earlier record.
    #[must_use]
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut bank = Self::empty();
        for question in questions {
            if let Some(slot) = Self::slot_index(question.id()) {
                bank.slots[slot] = Some(question);
            }
        }
        bank
    }

    fn slot_index(id: QuestionId) -> Option<usize> {
        let value = id.value() as usize;
        (1..=SLOT_COUNT).contains(&value).then(|| value - 1)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        Self::slot_index(id).and_then(|slot| self.slots[slot].as_ref())
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.get(id).is_some()
    }

    /// Number of authored slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Ids of every authored slot, ascending.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(Question::id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
