pub mod calls;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::endpoints::questions::EvaluationQuestion;
use crate::error::ValidationError;
use crate::evaluation::{validate_config, EvaluationConfig, EvaluationType};
use crate::timestamp::Timestamp;

pub const PROJECT_NAME_MAX: usize = 255;

// MODELS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: Uuid,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
    pub evaluation_type: EvaluationType,
    #[serde(default)]
    pub evaluation_config: Value,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub use_multi_questions: bool,
}

impl Project {
    /// The project-level evaluation, decoded by its `evaluation_type`.
    pub fn evaluation(&self) -> Result<EvaluationConfig, serde_json::Error> {
        EvaluationConfig::decode(self.evaluation_type, &self.evaluation_config)
    }
}

/// Row counts the backend attaches to listed projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    #[serde(default)]
    pub session_count: u64,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub rated_rows: u64,
}

impl ProjectStats {
    pub fn progress_percent(&self) -> u8 {
        crate::desk::progress_percent(self.rated_rows, self.total_rows)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListItem {
    #[serde(flatten)]
    pub project: Project,
    #[serde(flatten)]
    pub stats: ProjectStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBasic {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithQuestions {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub questions: Vec<EvaluationQuestion>,
    #[serde(default)]
    pub assigned_raters: Vec<UserBasic>,
    #[serde(flatten)]
    pub stats: ProjectStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<EvaluationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_config: Option<EvaluationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_multi_questions: Option<bool>,
}

impl ProjectCreate {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            ..Default::default()
        }
    }

    /// Sets the evaluation config together with its matching type.
    pub fn with_evaluation(mut self, config: EvaluationConfig) -> Self {
        self.evaluation_type = Some(config.kind());
        self.evaluation_config = Some(config);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<EvaluationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_config: Option<EvaluationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_multi_questions: Option<bool>,
}

impl ProjectUpdate {
    pub fn with_evaluation(mut self, config: EvaluationConfig) -> Self {
        self.evaluation_type = Some(config.kind());
        self.evaluation_config = Some(config);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.evaluation_type.is_none()
            && self.evaluation_config.is_none()
            && self.instructions.is_none()
            && self.use_multi_questions.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignRatersRequest {
    pub rater_ids: Vec<Uuid>,
}

// HELPER FUNCTIONS

pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "Project name cannot be empty"));
    }
    if name.chars().count() > PROJECT_NAME_MAX {
        return Err(ValidationError::new(
            "name",
            format!("Project name is too long (max {PROJECT_NAME_MAX} characters)"),
        ));
    }
    Ok(())
}

fn validate_evaluation(
    kind: Option<EvaluationType>,
    config: Option<&EvaluationConfig>,
) -> Result<(), ValidationError> {
    if let Some(config) = config {
        if kind.is_some_and(|kind| kind != config.kind()) {
            return Err(ValidationError::new(
                "evaluation_config",
                "Evaluation config does not match the evaluation type",
            ));
        }
        validate_config(config)?;
    }
    Ok(())
}

pub fn validate_create(request: &ProjectCreate) -> Result<(), ValidationError> {
    validate_project_name(&request.name)?;
    validate_evaluation(request.evaluation_type, request.evaluation_config.as_ref())
}

pub fn validate_update(request: &ProjectUpdate) -> Result<(), ValidationError> {
    if request.is_empty() {
        return Err(ValidationError::new("project", "Nothing to update"));
    }
    if let Some(name) = &request.name {
        validate_project_name(name)?;
    }
    validate_evaluation(request.evaluation_type, request.evaluation_config.as_ref())
}
