pub mod calls;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::evaluation::{validate_config, Conditional, EvaluationConfig, EvaluationType, FormQuestion};
use crate::timestamp::Timestamp;

pub const QUESTION_KEY_MAX: usize = 64;

// MODELS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationQuestion {
    pub id: Uuid,
    pub project_id: Uuid,
    pub order: i32,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub question_type: EvaluationType,
    #[serde(default)]
    pub config: Value,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub conditional: Option<Conditional>,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
}

impl EvaluationQuestion {
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

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationQuestionCreate {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub question_type: EvaluationType,
    pub config: EvaluationConfig,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl EvaluationQuestionCreate {
    pub fn new(key: &str, label: &str, config: EvaluationConfig) -> Self {
        Self {
            key: key.to_string(),
            label: label.trim().to_string(),
            description: None,
            question_type: config.kind(),
            config,
            required: true,
            conditional: None,
            order: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationQuestionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<EvaluationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderQuestionsRequest {
    pub question_ids: Vec<Uuid>,
}

fn default_required() -> bool {
    true
}

// HELPER FUNCTIONS

/// Decode a stored question into what the evaluation form works with.
#[allow(clippy::too_many_arguments)]
pub(crate) fn form_question(
    key: &str,
    label: &str,
    description: Option<&str>,
    kind: EvaluationType,
    config: &Value,
    required: bool,
    conditional: Option<&Conditional>,
    order: i32,
) -> Result<FormQuestion, serde_json::Error> {
    Ok(FormQuestion {
        key: key.to_string(),
        label: label.to_string(),
        description: description.map(str::to_string),
        config: EvaluationConfig::decode(kind, config)?,
        required,
        conditional: conditional.cloned(),
        order,
    })
}

/// What the key field turns typed input into: lower case, anything outside
/// `[a-z0-9_]` replaced by an underscore.
pub fn normalize_question_key(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' { c } else { '_' })
        .collect()
}

pub fn validate_question_key(key: &str) -> Result<(), ValidationError> {
    let Some(first) = key.chars().next() else {
        return Err(ValidationError::new("key", "Question key cannot be empty"));
    };

    if key.len() > QUESTION_KEY_MAX {
        return Err(ValidationError::new(
            "key",
            format!("Question key is too long (max {QUESTION_KEY_MAX} characters)"),
        ));
    }

    if !first.is_ascii_lowercase() {
        return Err(ValidationError::new("key", "Question key must start with a lowercase letter"));
    }

    if !key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(ValidationError::new(
            "key",
            "Question key can only contain lowercase letters, numbers and underscores",
        ));
    }

    Ok(())
}

fn validate_conditional(
    own_key: &str,
    conditional: &Conditional,
    known_keys: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if conditional.question == own_key {
        return Err(ValidationError::new("conditional", "A question cannot depend on itself"));
    }
    if !known_keys.contains(conditional.question.as_str()) {
        return Err(ValidationError::new(
            "conditional",
            format!("Conditional refers to unknown question '{}'", conditional.question),
        ));
    }
    if conditional.equals.is_null() {
        return Err(ValidationError::new("conditional", "Conditional needs a value to compare against"));
    }
    Ok(())
}

/// Validate a new question against the questions the project already has.
pub fn validate_new_question(
    request: &EvaluationQuestionCreate,
    existing: &[EvaluationQuestion],
) -> Result<(), ValidationError> {
    let known: HashSet<&str> = existing.iter().map(|q| q.key.as_str()).collect();
    validate_with_known(request, &known)
}

fn validate_with_known(
    request: &EvaluationQuestionCreate,
    known: &HashSet<&str>,
) -> Result<(), ValidationError> {
    validate_question_key(&request.key)?;

    if known.contains(request.key.as_str()) {
        return Err(ValidationError::new(
            "key",
            format!("A question with key '{}' already exists", request.key),
        ));
    }

    if request.label.trim().is_empty() {
        return Err(ValidationError::new("label", "Label cannot be empty"));
    }

    if request.question_type != request.config.kind() {
        return Err(ValidationError::new("config", "Config does not match the question type"));
    }
    validate_config(&request.config)?;

    if let Some(conditional) = &request.conditional {
        validate_conditional(&request.key, conditional, known)?;
    }

    Ok(())
}

/// Validate a batch. Keys must be unique across the batch and the project;
/// conditionals may refer to questions earlier in the batch.
pub fn validate_bulk(
    requests: &[EvaluationQuestionCreate],
    existing: &[EvaluationQuestion],
) -> Result<(), ValidationError> {
    if requests.is_empty() {
        return Err(ValidationError::new("questions", "No questions to create"));
    }

    let mut known: HashSet<&str> = existing.iter().map(|q| q.key.as_str()).collect();
    for request in requests {
        validate_with_known(request, &known)?;
        known.insert(request.key.as_str());
    }
    Ok(())
}

pub fn validate_update(
    question: &EvaluationQuestion,
    request: &EvaluationQuestionUpdate,
    siblings: &[EvaluationQuestion],
) -> Result<(), ValidationError> {
    if let Some(label) = &request.label {
        if label.trim().is_empty() {
            return Err(ValidationError::new("label", "Label cannot be empty"));
        }
    }

    if let Some(config) = &request.config {
        if config.kind() != question.question_type {
            return Err(ValidationError::new("config", "Config does not match the question type"));
        }
        validate_config(config)?;
    }

    if let Some(conditional) = &request.conditional {
        let known: HashSet<&str> = siblings
            .iter()
            .filter(|q| q.id != question.id)
            .map(|q| q.key.as_str())
            .collect();
        validate_conditional(&question.key, conditional, &known)?;
    }

    Ok(())
}

pub fn validate_reorder(ids: &[Uuid]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::new("question_ids", "Nothing to reorder"));
    }
    let unique: HashSet<&Uuid> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(ValidationError::new("question_ids", "Each question may appear only once"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{BinaryConfig, RatingConfig};
    use serde_json::json;

    fn stored(key: &str) -> EvaluationQuestion {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "project_id": Uuid::new_v4(),
            "order": 0,
            "key": key,
            "label": key,
            "question_type": "binary",
            "config": {},
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap()
    }

    fn rating_question(key: &str) -> EvaluationQuestionCreate {
        EvaluationQuestionCreate::new(key, "Quality", EvaluationConfig::Rating(RatingConfig::default()))
    }

    #[test]
    fn test_validate_question_key() {
        assert!(validate_question_key("overall_quality2").is_ok());
        assert!(validate_question_key("").is_err());
        assert!(validate_question_key("2fast").is_err());
        assert!(validate_question_key("_private").is_err());
        assert!(validate_question_key("Quality").is_err());
        assert!(validate_question_key("has-dash").is_err());
        assert!(validate_question_key(&"k".repeat(65)).is_err());
    }

    #[test]
    fn test_normalize_question_key() {
        assert_eq!(normalize_question_key("Overall Quality!"), "overall_quality_");
        assert_eq!(normalize_question_key(" is-ok "), "is_ok");
    }

    #[test]
    fn test_stored_question_defaults() {
        let question = stored("acceptable");
        assert!(question.required);
        assert!(question.conditional.is_none());

        let form = question.to_form_question().unwrap();
        assert_eq!(form.config, EvaluationConfig::Binary(BinaryConfig::default()));
    }

    #[test]
    fn test_new_question_rejects_duplicate_key() {
        let existing = vec![stored("quality")];
        let err = validate_new_question(&rating_question("quality"), &existing).unwrap_err();
        assert_eq!(err.field, "key");
        assert!(validate_new_question(&rating_question("clarity"), &existing).is_ok());
    }

    #[test]
    fn test_conditional_must_reference_known_question() {
        let existing = vec![stored("acceptable")];

        let mut request = rating_question("severity");
        request.conditional = Some(Conditional::new("acceptable", "no"));
        assert!(validate_new_question(&request, &existing).is_ok());

        request.conditional = Some(Conditional::new("missing", "no"));
        assert!(validate_new_question(&request, &existing).is_err());

        request.conditional = Some(Conditional::new("severity", "no"));
        assert!(validate_new_question(&request, &existing).is_err());
    }

    #[test]
    fn test_mismatched_type_and_config() {
        let mut request = rating_question("quality");
        request.question_type = EvaluationType::Text;
        assert!(validate_new_question(&request, &[]).is_err());
    }

    #[test]
    fn test_validate_bulk() {
        let mut second = rating_question("followup");
        second.conditional = Some(Conditional::new("first", 3));
        assert!(validate_bulk(&[rating_question("first"), second], &[]).is_ok());

        let err = validate_bulk(&[rating_question("dup"), rating_question("dup")], &[]).unwrap_err();
        assert!(err.message.contains("already exists"));

        assert!(validate_bulk(&[], &[]).is_err());
    }

    #[test]
    fn test_validate_update_and_reorder() {
        let question = stored("acceptable");
        let update = EvaluationQuestionUpdate {
            config: Some(EvaluationConfig::Rating(RatingConfig::default())),
            ..Default::default()
        };
        assert!(validate_update(&question, &update, &[]).is_err());

        let id = Uuid::new_v4();
        assert!(validate_reorder(&[id, Uuid::new_v4()]).is_ok());
        assert!(validate_reorder(&[id, id]).is_err());
        assert!(validate_reorder(&[]).is_err());
    }

    #[test]
    fn test_create_payload() {
        let body = serde_json::to_value(rating_question("quality")).unwrap();
        assert_eq!(body["question_type"], "rating");
        assert_eq!(body["config"], json!({"min": 1, "max": 5}));
        assert_eq!(body["required"], true);
        assert!(body.get("conditional").is_none());
    }
}
