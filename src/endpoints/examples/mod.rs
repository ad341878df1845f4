pub mod calls;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::evaluation::Submission;
use crate::timestamp::Timestamp;

// MODELS

/// A worked example shown to raters next to the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationExample {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: Map<String, Value>,
    pub example_response: Submission,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default = "default_positive")]
    pub is_positive: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationExampleCreate {
    pub title: String,
    pub content: Map<String, Value>,
    pub example_response: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_positive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationExampleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_response: Option<Submission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_positive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderExamplesRequest {
    pub example_ids: Vec<Uuid>,
}

fn default_positive() -> bool {
    true
}

// HELPER FUNCTIONS

pub fn validate_example(request: &AnnotationExampleCreate) -> Result<(), ValidationError> {
    if request.title.trim().is_empty() {
        return Err(ValidationError::new("title", "Title cannot be empty"));
    }
    if request.content.is_empty() {
        return Err(ValidationError::new("content", "Example content cannot be empty"));
    }
    if let Submission::Multi(answers) = &request.example_response {
        if answers.is_empty() {
            return Err(ValidationError::new("example_response", "Example needs at least one answer"));
        }
    }
    Ok(())
}

pub fn validate_reorder(ids: &[Uuid]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::new("example_ids", "Nothing to reorder"));
    }
    let unique: HashSet<&Uuid> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(ValidationError::new("example_ids", "Each example may appear only once"));
    }
    Ok(())
}

/// Split into (positive, negative), each sorted by `order`.
pub fn partition_examples(
    examples: &[AnnotationExample],
) -> (Vec<&AnnotationExample>, Vec<&AnnotationExample>) {
    let (mut positive, mut negative): (Vec<_>, Vec<_>) =
        examples.iter().partition(|example| example.is_positive);
    positive.sort_by_key(|example| example.order);
    negative.sort_by_key(|example| example.order);
    (positive, negative)
}
