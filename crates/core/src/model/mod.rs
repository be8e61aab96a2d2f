mod bank;
mod ids;
mod menu;
mod progress;
mod question;

pub use bank::{QuestionBank, SLOT_COUNT};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use menu::{MenuSlot, SlotState};
pub use progress::{AnswerRecord, ProgressRecord};
pub use question::{Question, QuestionBody, QuestionError, StandardQuestion, TrapQuestion};
