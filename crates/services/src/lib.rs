#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod identity;
pub mod quiz_service;
pub mod session;
pub mod view;

pub use quiz_core::Clock;

pub use bank::{BankLoader, parse_bank};
pub use error::{BankLoadError, EvaluationError, ExportError, LoginError, SessionError};
pub use evaluator::{Evaluation, evaluate, recover_rationale};
pub use export::{ExportArtifact, ExportFormat, export_progress};
pub use identity::{Identity, IdentityDirectory, UserAccount};
pub use quiz_service::{QuizService, ResetConfirmation};
pub use session::{AnswerFeedback, OpenOutcome, QuizSession};
pub use view::{ViewDescriptor, feedback_title, question_heading};
