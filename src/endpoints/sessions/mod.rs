pub mod calls;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::endpoints::questions::form_question;
use crate::error::ValidationError;
use crate::evaluation::{
    Conditional, EvaluationConfig, EvaluationForm, EvaluationResponse, EvaluationType,
    FormQuestion, MultiQuestionForm, RatingResponse, Submission,
};
use crate::timestamp::Timestamp;

pub const DATASET_EXTENSIONS: [&str; 3] = ["csv", "xls", "xlsx"];

// MODELS

/// One uploaded dataset within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub columns: Vec<String>,
    pub project_id: Uuid,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounts {
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub rated_count: u64,
}

impl SessionCounts {
    pub fn progress_percent(&self) -> u8 {
        crate::desk::progress_percent(self.rated_count, self.row_count)
    }

    pub fn is_complete(&self) -> bool {
        self.row_count > 0 && self.rated_count >= self.row_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionListItem {
    #[serde(flatten)]
    pub session: Session,
    #[serde(flatten)]
    pub counts: SessionCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub project: ProjectForSession,
    #[serde(flatten)]
    pub counts: SessionCounts,
}

/// A question as embedded in the session detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuestion {
    pub id: Uuid,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub question_type: EvaluationType,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub conditional: Option<Conditional>,
    #[serde(default)]
    pub order: i32,
}

impl SessionQuestion {
    pub fn to_form_question(&self) -> Result<FormQuestion, serde_json::Error> {
        form_question(
            &self.key,
            &self.label,
            self.description.as_deref(),
            self.question_type,
            &self.config,
            self.required,
            self.conditional.as_ref(),
            self.order,
        )
    }
}

/// The slice of the project a rater needs to work on a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectForSession {
    pub id: Uuid,
    pub name: String,
    pub evaluation_type: EvaluationType,
    #[serde(default)]
    pub evaluation_config: Value,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub use_multi_questions: bool,
    #[serde(default)]
    pub questions: Vec<SessionQuestion>,
}

impl ProjectForSession {
    pub fn evaluation(&self) -> Result<EvaluationConfig, serde_json::Error> {
        EvaluationConfig::decode(self.evaluation_type, &self.evaluation_config)
    }

    /// Multi-question mode only applies when the project has questions to show.
    pub fn is_multi_question(&self) -> bool {
        self.use_multi_questions && !self.questions.is_empty()
    }

    pub fn evaluation_form(&self) -> Result<EvaluationForm, serde_json::Error> {
        if self.is_multi_question() {
            let questions = self
                .questions
                .iter()
                .map(SessionQuestion::to_form_question)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(EvaluationForm::Multi(MultiQuestionForm::new(questions)))
        } else {
            Ok(EvaluationForm::single(self.evaluation()?))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    #[serde(default)]
    pub rating_value: Option<i64>,
    #[serde(default)]
    pub response: Option<Submission>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(with = "crate::timestamp")]
    pub rated_at: Timestamp,
    pub rater_id: Uuid,
    #[serde(default)]
    pub rater_username: String,
}

impl Rating {
    /// The stored answer. Older ratings only carry `rating_value`.
    pub fn submission(&self) -> Option<Submission> {
        self.response.clone().or_else(|| {
            self.rating_value
                .map(|value| Submission::Single(EvaluationResponse::Rating(RatingResponse { value })))
        })
    }

    pub fn summary(&self) -> String {
        self.submission()
            .map(|s| s.summary())
            .unwrap_or_else(|| "No response".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub id: Uuid,
    pub row_index: i64,
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub my_rating: Option<Rating>,
}

impl DataRow {
    /// Ratings from everyone except the current rater.
    pub fn other_ratings(&self) -> Vec<&Rating> {
        let mine = self.my_rating.as_ref().map(|r| r.id);
        self.ratings
            .iter()
            .filter(|rating| Some(rating.id) != mine)
            .collect()
    }

    pub fn is_rated(&self) -> bool {
        self.my_rating.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedRows {
    pub items: Vec<DataRow>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub rated_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub session_name: String,
    pub filename: String,
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<String>,
    pub project_id: Uuid,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowFilter {
    #[default]
    All,
    Rated,
    Unrated,
}

impl RowFilter {
    pub const ALL: [RowFilter; 3] = [RowFilter::All, RowFilter::Unrated, RowFilter::Rated];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowFilter::All => "all",
            RowFilter::Rated => "rated",
            RowFilter::Unrated => "unrated",
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ValidationError::new("filter", format!("Unknown filter '{s}', expected all, rated or unrated")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ValidationError::new("format", format!("Unknown export format '{other}', expected xlsx or csv"))),
        }
    }
}

/// A downloaded export and the file name to save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// HELPER FUNCTIONS

/// Uploads must be `.csv`, `.xls` or `.xlsx`, in any letter case.
pub fn validate_dataset_file(path: &Path) -> Result<(), ValidationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(ext) if DATASET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ValidationError::new(
            "file",
            "Only Excel files (.xlsx, .xls) and CSV files (.csv) are supported",
        )),
    }
}

pub fn dataset_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("csv") => "text/csv",
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    }
}

/// `<session name>.<ext>`, with path separators and control characters replaced.
pub fn export_file_name(session_name: &str, format: ExportFormat) -> String {
    let stem: String = session_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "export".to_string() } else { stem };
    format!("{stem}.{}", format.extension())
}
