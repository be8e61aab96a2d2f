use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use quiz_core::model::{AnswerRecord, ProgressRecord, QuestionId, UserId};

use crate::error::ExportError;

//
// ─── FORMATS ───────────────────────────────────────────────────────────────────
//

/// Supported download formats for a progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

/// A ready-to-download progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub media_type: &'static str,
    pub contents: String,
}

//
// ─── JSON PAYLOAD ──────────────────────────────────────────────────────────────
//

/// Wire shape of the JSON export, matching the established download format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload<'a> {
    username: &'a str,
    exported_at: DateTime<Utc>,
    answered_ids: &'a [QuestionId],
    results: &'a BTreeMap<QuestionId, AnswerRecord>,
}

//
// ─── EXPORT ────────────────────────────────────────────────────────────────────
//

/// Builds a download artifact for a user's current progress.
///
/// Every answered id appears in the artifact; ids with no result entry
/// (consumed traps) carry empty result fields in CSV and are simply absent
/// from the JSON `results` map.
///
/// # Errors
///
/// Returns `ExportError` when serialization fails.
pub fn export_progress(
    user: &UserId,
    progress: &ProgressRecord,
    exported_at: DateTime<Utc>,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let contents = match format {
        ExportFormat::Json => {
            let payload = ExportPayload {
                username: user.as_str(),
                exported_at,
                answered_ids: progress.answered_ids(),
                results: progress.results(),
            };
            serde_json::to_string_pretty(&payload)?
        }
        ExportFormat::Csv => render_csv(progress)?,
    };

    Ok(ExportArtifact {
        filename: export_filename(user, exported_at, format),
        media_type: format.media_type(),
        contents,
    })
}

fn render_csv(progress: &ProgressRecord) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "questionId",
        "correct",
        "selectedIndex",
        "selectedText",
        "correctIndex",
        "correctText",
        "timestamp",
    ])?;

    for id in progress.answered_ids() {
        match progress.results().get(id) {
            Some(record) => writer.write_record([
                id.to_string(),
                record.is_correct.to_string(),
                record.selected_index.to_string(),
                record.selected_text.clone(),
                record.correct_index.to_string(),
                record.correct_text.clone(),
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ])?,
            // Consumed trap: the slot counts as done but has no evaluation.
            None => writer.write_record([
                id.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ])?,
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Encoding(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Encoding(err.to_string()))
}

/// Filesystem-safe filename: `quiz-progress-<user>-<timestamp>.<ext>`, with
/// `:` and `.` in the timestamp flattened to `-`.
fn export_filename(user: &UserId, exported_at: DateTime<Utc>, format: ExportFormat) -> String {
    let stamp = exported_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "quiz-progress-{}-{stamp}.{}",
        user.as_str(),
        format.extension()
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
