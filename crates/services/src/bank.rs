use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use quiz_core::lang::{LocalizedList, LocalizedText};
use quiz_core::model::{
    Question, QuestionBank, QuestionBody, QuestionId, SLOT_COUNT, StandardQuestion, TrapQuestion,
};

use crate::error::BankLoadError;

//
// ─── RAW BANK SCHEMA ───────────────────────────────────────────────────────────
//

/// The bank document is either a bare array of records or wrapped in a
/// `{ "questions": [...] }` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BankDocument {
    Envelope { questions: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

impl BankDocument {
    fn into_records(self) -> Vec<serde_json::Value> {
        match self {
            Self::Envelope { questions } => questions,
            Self::Bare(records) => records,
        }
    }
}

/// One record as authored in the bank file. Every field is optional so a
/// single malformed record never sinks the whole document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: Option<i64>,
    #[serde(default)]
    trap: Option<serde_json::Value>,
    #[serde(default)]
    trap_message: Option<LocalizedText>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default, alias = "q")]
    question: Option<LocalizedText>,
    #[serde(default)]
    options: Option<LocalizedList>,
    #[serde(default)]
    rationales: Option<LocalizedList>,
    #[serde(default)]
    correct_index: Option<i64>,
}

/// The original data marks traps with any truthy `trap` field
/// (usually the string `"phishing"`).
fn is_trap_marker(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

impl RawQuestion {
    fn into_question(self) -> Option<Question> {
        let id = self
            .id
            .and_then(|id| u32::try_from(id).ok())
            .map(QuestionId::new)?;
        if !(1..=SLOT_COUNT as u32).contains(&id.value()) {
            return None;
        }

        if self.trap.as_ref().is_some_and(is_trap_marker) {
            let message = self.trap_message.unwrap_or_default();
            return Some(Question::new(
                id,
                QuestionBody::Trap(TrapQuestion::new(message, self.image)),
            ));
        }

        let correct_index = match self.correct_index.and_then(|i| usize::try_from(i).ok()) {
            Some(index) => index,
            None => {
                warn!(%id, "record has no usable correctIndex, dropping");
                return None;
            }
        };

        let standard = StandardQuestion::new(
            self.question.unwrap_or_default(),
            self.options.unwrap_or_default(),
            self.rationales.unwrap_or_default(),
            correct_index,
        );
        match standard {
            Ok(standard) => Some(Question::new(id, QuestionBody::Standard(standard))),
            Err(err) => {
                warn!(%id, %err, "invalid standard question, dropping");
                None
            }
        }
    }
}

//
// ─── PARSING ───────────────────────────────────────────────────────────────────
//

/// Parses a bank document into the dense slot table.
///
/// Records with a missing or out-of-range id, or that fail validation, are
/// discarded individually; only a document that is not an array (or envelope
/// of one) at all is an error.
///
/// # Errors
///
/// Returns `BankLoadError::Parse` when the document is not well-formed JSON of
/// the expected shape.
pub fn parse_bank(raw: &str) -> Result<QuestionBank, BankLoadError> {
    let document: BankDocument = serde_json::from_str(raw)?;

    let questions = document.into_records().into_iter().filter_map(|value| {
        match serde_json::from_value::<RawQuestion>(value) {
            Ok(record) => record.into_question(),
            Err(err) => {
                warn!(%err, "undecodable bank record, dropping");
                None
            }
        }
    });

    Ok(QuestionBank::from_questions(questions))
}

//
// ─── LOADER ────────────────────────────────────────────────────────────────────
//

/// One-shot retrieval of the static question bank.
///
/// The bank loads exactly once at startup; on failure the caller keeps an
/// empty bank and surfaces a visible load-failed state. Reloading means
/// restarting the app.
#[derive(Clone, Default)]
pub struct BankLoader {
    client: Client,
}

impl BankLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch and parse the bank from a URL.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` when the request fails, the server answers with
    /// a non-success status, or the body does not parse.
    pub async fn fetch(&self, url: &str) -> Result<QuestionBank, BankLoadError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BankLoadError::HttpStatus(response.status()));
        }
        let body = response.text().await?;
        parse_bank(&body)
    }

    /// Read and parse the bank from a local file.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` when the file cannot be read or does not parse.
    pub fn load_file(&self, path: &std::path::Path) -> Result<QuestionBank, BankLoadError> {
        let body = std::fs::read_to_string(path)?;
        parse_bank(&body)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::Language;

    #[test]
    fn parses_bare_array_and_envelope() {
        let bare = r#"[
            {"id": 7, "question": {"pt": "P?", "en": "Q?"},
             "options": {"pt": ["A", "B", "C"], "en": ["A", "B", "C"]},
             "rationales": {"pt": ["rA", "rB", "rC"], "en": ["rA", "rB", "rC"]},
             "correctIndex": 1}
        ]"#;
        let bank = parse_bank(bare).unwrap();
        assert!(bank.contains(QuestionId::new(7)));

        let wrapped = format!("{{\"questions\": {bare}}}");
        let bank = parse_bank(&wrapped).unwrap();
        assert!(bank.contains(QuestionId::new(7)));
    }

    #[test]
    fn discards_records_with_bad_ids() {
        let raw = r#"[
            {"id": 0, "trap": "phishing"},
            {"id": 451, "trap": "phishing"},
            {"trap": "phishing"},
            {"id": "nine", "trap": "phishing"},
            {"id": 9, "trap": "phishing"}
        ]"#;
        let bank = parse_bank(raw).unwrap();
        assert_eq!(bank.len(), 1);
        assert!(bank.contains(QuestionId::new(9)));
    }

    #[test]
    fn discards_standard_record_without_correct_index() {
        let raw = r#"[
            {"id": 3, "question": "Q?", "options": {"pt": ["A", "B"]}},
            {"id": 4, "question": "Q?", "options": {"pt": ["A", "B"]}, "correctIndex": 5}
        ]"#;
        let bank = parse_bank(raw).unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn accepts_legacy_prompt_alias() {
        let raw = r#"[
            {"id": 2, "q": "legacy prompt", "options": {"pt": ["A"]}, "correctIndex": 0}
        ]"#;
        let bank = parse_bank(raw).unwrap();
        let question = bank.get(QuestionId::new(2)).unwrap();
        let QuestionBody::Standard(standard) = question.body() else {
            panic!("expected a standard question");
        };
        assert_eq!(standard.prompt().resolve(Language::Pt), "legacy prompt");
    }

    #[test]
    fn trap_marker_is_truthy_like_the_original() {
        let raw = r#"[
            {"id": 12, "trap": "phishing", "trapMessage": {"pt": "Caiu!", "en": "Caught!"}},
            {"id": 13, "trap": false, "question": "Q?", "options": {"pt": ["A"]}, "correctIndex": 0},
            {"id": 14, "trap": ""}
        ]"#;
        let bank = parse_bank(raw).unwrap();

        assert!(bank.get(QuestionId::new(12)).unwrap().is_trap());
        assert!(!bank.get(QuestionId::new(13)).unwrap().is_trap());
        // falsy marker plus no correctIndex: the record is dropped entirely
        assert!(!bank.contains(QuestionId::new(14)));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            parse_bank("{\"status\": \"ok\"}"),
            Err(BankLoadError::Parse(_))
        ));
        assert!(matches!(parse_bank("not json"), Err(BankLoadError::Parse(_))));
    }
}
