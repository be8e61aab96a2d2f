use crate::model::ids::QuestionId;

/// Render state of one menu slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No question is authored at this id; the slot is unavailable.
    Missing,
    /// Answered (or a consumed trap); disabled for non-privileged users.
    Completed,
    /// Authored and selectable.
    Open,
}

impl SlotState {
    #[must_use]
    pub fn is_selectable(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// One entry of the 450-slot menu, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSlot {
    pub id: QuestionId,
    pub state: SlotState,
}
