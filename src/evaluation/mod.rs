pub mod form;
pub mod input;
pub mod visibility;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use form::{EvaluationForm, FormQuestion, MultiQuestionForm};
pub use visibility::{is_visible, Conditional};

pub const CONFIDENCE_LEVELS: [&str; 3] = ["very_confident", "somewhat_confident", "not_confident"];

/// Fields the answer decoder recognises a response kind by.
pub const RESPONSE_FIELDS: [&str; 5] = ["value", "selected", "criteria", "winner", "text"];

const SUMMARY_TEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Rating,
    Binary,
    MultiLabel,
    MultiCriteria,
    Pairwise,
    Text,
}

impl EvaluationType {
    pub const ALL: [EvaluationType; 6] = [
        EvaluationType::Rating,
        EvaluationType::Binary,
        EvaluationType::MultiLabel,
        EvaluationType::MultiCriteria,
        EvaluationType::Pairwise,
        EvaluationType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::Rating => "rating",
            EvaluationType::Binary => "binary",
            EvaluationType::MultiLabel => "multi_label",
            EvaluationType::MultiCriteria => "multi_criteria",
            EvaluationType::Pairwise => "pairwise",
            EvaluationType::Text => "text",
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvaluationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ValidationError::new(
                    "evaluation_type",
                    format!(
                        "Invalid evaluation type '{}'. Must be one of: rating, binary, multi_label, multi_criteria, pairwise, text",
                        s
                    ),
                )
            })
    }
}

// CONFIGS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub min: i64,
    pub max: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self { min: 1, max: 5, labels: None }
    }
}

impl RatingConfig {
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn label_for(&self, value: i64) -> String {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(&value.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("Rating {value}"))
    }

    /// Digit shortcuts go from 1 to `max`; values below `min` are ignored.
    pub fn shortcut(&self, digit: i64) -> Option<RatingResponse> {
        (digit >= 1 && self.contains(digit)).then_some(RatingResponse { value: digit })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self { value: value.to_string(), label: label.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    pub options: Vec<ChoiceOption>,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            options: vec![ChoiceOption::new("yes", "Yes"), ChoiceOption::new("no", "No")],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiLabelConfig {
    pub options: Vec<ChoiceOption>,
    pub min_select: usize,
    pub max_select: Option<usize>,
}

impl MultiLabelConfig {
    /// Toggle one option. Adding past `max_select` leaves the selection unchanged.
    pub fn toggle(&self, current: &MultiLabelResponse, value: &str) -> MultiLabelResponse {
        let mut selected = current.selected.clone();
        if let Some(pos) = selected.iter().position(|v| v == value) {
            selected.remove(pos);
        } else {
            selected.push(value.to_string());
        }

        match self.max_select {
            Some(max) if selected.len() > max => current.clone(),
            _ => MultiLabelResponse { selected },
        }
    }

    pub fn at_max(&self, current: &MultiLabelResponse) -> bool {
        self.max_select.is_some_and(|max| current.selected.len() >= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaItem {
    pub key: String,
    pub label: String,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiCriteriaConfig {
    pub criteria: Vec<CriteriaItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairwiseConfig {
    pub show_confidence: bool,
    pub allow_tie: bool,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self { show_confidence: false, allow_tie: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub multiline: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { placeholder: None, max_length: None, multiline: true }
    }
}

impl TextConfig {
    /// Truncate input to `max_length` characters, the way the text widget does.
    pub fn clamp(&self, text: &str) -> TextResponse {
        let text = match self.max_length {
            Some(max) if text.chars().count() > max => text.chars().take(max).collect(),
            _ => text.to_string(),
        };
        TextResponse { text }
    }

    pub fn placeholder(&self) -> &str {
        self.placeholder
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or("Enter your response...")
    }
}

/// A project's or question's configuration. The wire format is the bare
/// config object; the variant comes from the sibling `evaluation_type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationConfig {
    Rating(RatingConfig),
    Binary(BinaryConfig),
    MultiLabel(MultiLabelConfig),
    MultiCriteria(MultiCriteriaConfig),
    Pairwise(PairwiseConfig),
    Text(TextConfig),
}

impl EvaluationConfig {
    pub fn decode(kind: EvaluationType, raw: &Value) -> Result<Self, serde_json::Error> {
        let raw = if raw.is_null() {
            Value::Object(Default::default())
        } else {
            raw.clone()
        };

        Ok(match kind {
            EvaluationType::Rating => EvaluationConfig::Rating(serde_json::from_value(raw)?),
            EvaluationType::Binary => EvaluationConfig::Binary(serde_json::from_value(raw)?),
            EvaluationType::MultiLabel => EvaluationConfig::MultiLabel(serde_json::from_value(raw)?),
            EvaluationType::MultiCriteria => {
                EvaluationConfig::MultiCriteria(serde_json::from_value(raw)?)
            }
            EvaluationType::Pairwise => EvaluationConfig::Pairwise(serde_json::from_value(raw)?),
            EvaluationType::Text => EvaluationConfig::Text(serde_json::from_value(raw)?),
        })
    }

    /// Starting configuration offered by the question editor for a new question.
    pub fn default_for(kind: EvaluationType) -> Self {
        match kind {
            EvaluationType::Rating => EvaluationConfig::Rating(RatingConfig::default()),
            EvaluationType::Binary => EvaluationConfig::Binary(BinaryConfig::default()),
            EvaluationType::MultiLabel => EvaluationConfig::MultiLabel(MultiLabelConfig {
                options: vec![ChoiceOption::new("option1", "Option 1")],
                min_select: 0,
                max_select: None,
            }),
            EvaluationType::MultiCriteria => EvaluationConfig::MultiCriteria(MultiCriteriaConfig {
                criteria: vec![CriteriaItem {
                    key: "quality".to_string(),
                    label: "Quality".to_string(),
                    min: 1,
                    max: 5,
                }],
            }),
            EvaluationType::Pairwise => EvaluationConfig::Pairwise(PairwiseConfig {
                show_confidence: true,
                allow_tie: true,
            }),
            EvaluationType::Text => EvaluationConfig::Text(TextConfig::default()),
        }
    }

    pub fn kind(&self) -> EvaluationType {
        match self {
            EvaluationConfig::Rating(_) => EvaluationType::Rating,
            EvaluationConfig::Binary(_) => EvaluationType::Binary,
            EvaluationConfig::MultiLabel(_) => EvaluationType::MultiLabel,
            EvaluationConfig::MultiCriteria(_) => EvaluationType::MultiCriteria,
            EvaluationConfig::Pairwise(_) => EvaluationType::Pairwise,
            EvaluationConfig::Text(_) => EvaluationType::Text,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// RESPONSES

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResponse {
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryResponse {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLabelResponse {
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiCriteriaResponse {
    pub criteria: BTreeMap<String, i64>,
}

impl MultiCriteriaResponse {
    pub fn set(&self, key: &str, value: i64) -> Self {
        let mut criteria = self.criteria.clone();
        criteria.insert(key.to_string(), value);
        Self { criteria }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Tie => "tie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseResponse {
    pub winner: Winner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

/// One answer. Untagged on the wire, so the variant is recovered from the
/// fields present: a numeric `value` is a rating, a string `value` a binary
/// choice, then `selected`, `criteria`, `winner` and `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationResponse {
    Rating(RatingResponse),
    Binary(BinaryResponse),
    MultiLabel(MultiLabelResponse),
    MultiCriteria(MultiCriteriaResponse),
    Pairwise(PairwiseResponse),
    Text(TextResponse),
}

impl EvaluationResponse {
    pub fn kind(&self) -> EvaluationType {
        match self {
            EvaluationResponse::Rating(_) => EvaluationType::Rating,
            EvaluationResponse::Binary(_) => EvaluationType::Binary,
            EvaluationResponse::MultiLabel(_) => EvaluationType::MultiLabel,
            EvaluationResponse::MultiCriteria(_) => EvaluationType::MultiCriteria,
            EvaluationResponse::Pairwise(_) => EvaluationType::Pairwise,
            EvaluationResponse::Text(_) => EvaluationType::Text,
        }
    }

    /// Short human summary, used when listing other raters' answers.
    pub fn summary(&self) -> String {
        match self {
            EvaluationResponse::Rating(r) => r.value.to_string(),
            EvaluationResponse::Binary(b) => b.value.clone(),
            EvaluationResponse::MultiLabel(m) => m.selected.join(", "),
            EvaluationResponse::Pairwise(p) => format!("Winner: {}", p.winner.as_str()),
            EvaluationResponse::Text(t) => truncate(&t.text, SUMMARY_TEXT_CHARS),
            EvaluationResponse::MultiCriteria(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

/// What a rater submits for a row: one answer, or one answer per question key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Submission {
    Single(EvaluationResponse),
    Multi(BTreeMap<String, EvaluationResponse>),
}

/// An object whose values are all answer objects is a multi-question set,
/// whatever its keys are called. Anything else is a single answer.
impl<'de> Deserialize<'de> for Submission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if is_answer_map(&raw) {
            serde_json::from_value(raw).map(Submission::Multi).map_err(D::Error::custom)
        } else {
            serde_json::from_value(raw).map(Submission::Single).map_err(D::Error::custom)
        }
    }
}

fn is_answer_map(raw: &Value) -> bool {
    let Value::Object(entries) = raw else {
        return false;
    };
    entries.values().all(|entry| {
        entry
            .as_object()
            .is_some_and(|fields| RESPONSE_FIELDS.iter().any(|field| fields.contains_key(*field)))
    })
}

impl Submission {
    pub fn summary(&self) -> String {
        match self {
            Submission::Single(response) => response.summary(),
            Submission::Multi(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn rating_value(&self) -> Option<i64> {
        match self {
            Submission::Single(EvaluationResponse::Rating(r)) => Some(r.value),
            _ => None,
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

// VALIDATION

/// Validate a configuration before it is sent to the backend.
pub fn validate_config(config: &EvaluationConfig) -> Result<(), ValidationError> {
    match config {
        EvaluationConfig::Rating(c) => validate_bounds("config", c.min, c.max),
        EvaluationConfig::Binary(c) => {
            validate_options(&c.options)?;
            if c.options.len() < 2 {
                return Err(ValidationError::new("options", "Binary questions need at least two options"));
            }
            Ok(())
        }
        EvaluationConfig::MultiLabel(c) => {
            validate_options(&c.options)?;
            if c.min_select > c.options.len() {
                return Err(ValidationError::new("min_select", "Cannot require more selections than there are options"));
            }
            if let Some(max) = c.max_select {
                if max == 0 {
                    return Err(ValidationError::new("max_select", "Maximum selections must be at least 1"));
                }
                if max < c.min_select {
                    return Err(ValidationError::new("max_select", "Maximum selections cannot be below the minimum"));
                }
            }
            Ok(())
        }
        EvaluationConfig::MultiCriteria(c) => {
            if c.criteria.is_empty() {
                return Err(ValidationError::new("criteria", "At least one criterion is required"));
            }
            let mut seen = HashSet::new();
            for item in &c.criteria {
                if item.key.trim().is_empty() {
                    return Err(ValidationError::new("criteria", "Criterion key cannot be empty"));
                }
                if !seen.insert(item.key.as_str()) {
                    return Err(ValidationError::new("criteria", format!("Duplicate criterion key '{}'", item.key)));
                }
                if RESPONSE_FIELDS.contains(&item.key.as_str()) {
                    return Err(ValidationError::new(
                        "criteria",
                        format!("'{}' is reserved and cannot be a criterion key", item.key),
                    ));
                }
                validate_bounds(&item.key, item.min, item.max)?;
            }
            Ok(())
        }
        EvaluationConfig::Pairwise(_) => Ok(()),
        EvaluationConfig::Text(c) => match c.max_length {
            Some(0) => Err(ValidationError::new("max_length", "Maximum length must be positive")),
            _ => Ok(()),
        },
    }
}

fn validate_bounds(field: &str, min: i64, max: i64) -> Result<(), ValidationError> {
    if min >= max {
        return Err(ValidationError::new(field, format!("min ({min}) must be below max ({max})")));
    }
    Ok(())
}

fn validate_options(options: &[ChoiceOption]) -> Result<(), ValidationError> {
    if options.is_empty() {
        return Err(ValidationError::new("options", "At least one option is required"));
    }
    let mut seen = HashSet::new();
    for option in options {
        if option.value.trim().is_empty() {
            return Err(ValidationError::new("options", "Option value cannot be empty"));
        }
        if !seen.insert(option.value.as_str()) {
            return Err(ValidationError::new("options", format!("Duplicate option value '{}'", option.value)));
        }
    }
    Ok(())
}

/// Check an answer against the configuration it was given for.
pub fn validate_response(
    config: &EvaluationConfig,
    response: &EvaluationResponse,
) -> Result<(), ValidationError> {
    match (config, response) {
        (EvaluationConfig::Rating(c), EvaluationResponse::Rating(r)) => {
            if !c.contains(r.value) {
                return Err(ValidationError::new(
                    "value",
                    format!("Rating must be between {} and {}", c.min, c.max),
                ));
            }
            Ok(())
        }
        (EvaluationConfig::Binary(c), EvaluationResponse::Binary(b)) => {
            if !c.options.iter().any(|o| o.value == b.value) {
                return Err(ValidationError::new("value", format!("'{}' is not one of the options", b.value)));
            }
            Ok(())
        }
        (EvaluationConfig::MultiLabel(c), EvaluationResponse::MultiLabel(m)) => {
            let mut seen = HashSet::new();
            for value in &m.selected {
                if !c.options.iter().any(|o| &o.value == value) {
                    return Err(ValidationError::new("selected", format!("'{value}' is not one of the options")));
                }
                if !seen.insert(value.as_str()) {
                    return Err(ValidationError::new("selected", format!("'{value}' is selected twice")));
                }
            }
            if m.selected.len() < c.min_select {
                return Err(ValidationError::new("selected", format!("Select at least {}", c.min_select)));
            }
            if let Some(max) = c.max_select {
                if m.selected.len() > max {
                    return Err(ValidationError::new("selected", format!("Select at most {max}")));
                }
            }
            Ok(())
        }
        (EvaluationConfig::MultiCriteria(c), EvaluationResponse::MultiCriteria(m)) => {
            for item in &c.criteria {
                match m.criteria.get(&item.key) {
                    None => {
                        return Err(ValidationError::new(item.key.as_str(), format!("{} is not rated", item.label)));
                    }
                    Some(v) if *v < item.min || *v > item.max => {
                        return Err(ValidationError::new(
                            item.key.as_str(),
                            format!("{} must be between {} and {}", item.label, item.min, item.max),
                        ));
                    }
                    Some(_) => {}
                }
            }
            if let Some(unknown) = m.criteria.keys().find(|k| !c.criteria.iter().any(|i| &i.key == *k)) {
                return Err(ValidationError::new("criteria", format!("Unknown criterion '{unknown}'")));
            }
            Ok(())
        }
        (EvaluationConfig::Pairwise(c), EvaluationResponse::Pairwise(p)) => {
            if p.winner == Winner::Tie && !c.allow_tie {
                return Err(ValidationError::new("winner", "Ties are not allowed"));
            }
            if let Some(confidence) = p.confidence.as_deref().filter(|s| !s.is_empty()) {
                if !CONFIDENCE_LEVELS.contains(&confidence) {
                    return Err(ValidationError::new("confidence", format!("Unknown confidence '{confidence}'")));
                }
            }
            Ok(())
        }
        (EvaluationConfig::Text(c), EvaluationResponse::Text(t)) => {
            if t.text.trim().is_empty() {
                return Err(ValidationError::new("text", "Response cannot be empty"));
            }
            if let Some(max) = c.max_length {
                if t.text.chars().count() > max {
                    return Err(ValidationError::new("text", format!("Response is longer than {max} characters")));
                }
            }
            Ok(())
        }
        (config, response) => Err(ValidationError::new(
            "response",
            format!("Expected a {} response, got {}", config.kind(), response.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluation_type_round_trips_wire_names() {
        for kind in EvaluationType::ALL {
            assert_eq!(kind.as_str().parse::<EvaluationType>().unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        assert!("likert".parse::<EvaluationType>().is_err());
    }

    #[test]
    fn test_decode_fills_widget_defaults() {
        let config = EvaluationConfig::decode(EvaluationType::Pairwise, &json!({})).unwrap();
        assert_eq!(config, EvaluationConfig::Pairwise(PairwiseConfig { show_confidence: false, allow_tie: true }));

        let config = EvaluationConfig::decode(EvaluationType::Rating, &Value::Null).unwrap();
        assert_eq!(config, EvaluationConfig::Rating(RatingConfig::default()));

        let config = EvaluationConfig::decode(
            EvaluationType::MultiLabel,
            &json!({"options": [{"value": "a", "label": "A"}], "max_select": null}),
        )
        .unwrap();
        match config {
            EvaluationConfig::MultiLabel(c) => {
                assert_eq!(c.min_select, 0);
                assert_eq!(c.max_select, None);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn test_config_serializes_bare() {
        let config = EvaluationConfig::default_for(EvaluationType::Rating);
        assert_eq!(config.to_value(), json!({"min": 1, "max": 5}));
    }

    #[test]
    fn test_response_decoding_by_shape() {
        let cases = [
            (json!({"value": 4}), EvaluationType::Rating),
            (json!({"value": "yes"}), EvaluationType::Binary),
            (json!({"selected": ["a", "b"]}), EvaluationType::MultiLabel),
            (json!({"criteria": {"quality": 3}}), EvaluationType::MultiCriteria),
            (json!({"winner": "tie"}), EvaluationType::Pairwise),
            (json!({"text": "fine"}), EvaluationType::Text),
        ];
        for (raw, kind) in cases {
            let response: EvaluationResponse = serde_json::from_value(raw).unwrap();
            assert_eq!(response.kind(), kind);
        }
    }

    #[test]
    fn test_submission_single_vs_multi() {
        let single: Submission = serde_json::from_value(json!({"value": 2})).unwrap();
        assert_eq!(single.rating_value(), Some(2));

        let multi: Submission = serde_json::from_value(json!({
            "relevance": {"value": 5},
            "notes": {"text": "ok"}
        }))
        .unwrap();
        match multi {
            Submission::Multi(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map["notes"].kind(), EvaluationType::Text);
            }
            other => panic!("expected multi submission, got {other:?}"),
        }
    }

    #[test]
    fn test_rating_bounds() {
        let config = EvaluationConfig::Rating(RatingConfig { min: 1, max: 5, labels: None });
        assert!(validate_response(&config, &EvaluationResponse::Rating(RatingResponse { value: 5 })).is_ok());
        assert!(validate_response(&config, &EvaluationResponse::Rating(RatingResponse { value: 0 })).is_err());
        assert!(validate_response(&config, &EvaluationResponse::Rating(RatingResponse { value: 6 })).is_err());
    }

    #[test]
    fn test_rating_shortcut_and_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("1".to_string(), "Terrible".to_string());
        let config = RatingConfig { min: 2, max: 4, labels: Some(labels) };

        assert_eq!(config.shortcut(3), Some(RatingResponse { value: 3 }));
        assert_eq!(config.shortcut(1), None);
        assert_eq!(config.shortcut(5), None);
        assert_eq!(config.label_for(1), "Terrible");
        assert_eq!(config.label_for(3), "Rating 3");
    }

    #[test]
    fn test_multi_label_select_counts() {
        let config = MultiLabelConfig {
            options: vec![ChoiceOption::new("a", "A"), ChoiceOption::new("b", "B"), ChoiceOption::new("c", "C")],
            min_select: 1,
            max_select: Some(2),
        };
        let wrapped = EvaluationConfig::MultiLabel(config.clone());

        let empty = MultiLabelResponse::default();
        assert!(validate_response(&wrapped, &EvaluationResponse::MultiLabel(empty.clone())).is_err());

        let one = config.toggle(&empty, "a");
        let two = config.toggle(&one, "b");
        let still_two = config.toggle(&two, "c");
        assert_eq!(still_two, two);
        assert!(config.at_max(&two));
        assert!(validate_response(&wrapped, &EvaluationResponse::MultiLabel(two.clone())).is_ok());

        let back_to_one = config.toggle(&two, "a");
        assert_eq!(back_to_one.selected, vec!["b".to_string()]);

        let unknown = MultiLabelResponse { selected: vec!["z".to_string()] };
        assert!(validate_response(&wrapped, &EvaluationResponse::MultiLabel(unknown)).is_err());
    }

    #[test]
    fn test_multi_criteria_requires_every_criterion() {
        let config = EvaluationConfig::MultiCriteria(MultiCriteriaConfig {
            criteria: vec![
                CriteriaItem { key: "fluency".into(), label: "Fluency".into(), min: 1, max: 5 },
                CriteriaItem { key: "accuracy".into(), label: "Accuracy".into(), min: 1, max: 3 },
            ],
        });

        let partial = MultiCriteriaResponse::default().set("fluency", 4);
        let err = validate_response(&config, &EvaluationResponse::MultiCriteria(partial.clone())).unwrap_err();
        assert_eq!(err.field, "accuracy");

        let out_of_range = partial.set("accuracy", 4);
        assert!(validate_response(&config, &EvaluationResponse::MultiCriteria(out_of_range)).is_err());

        let complete = partial.set("accuracy", 2);
        assert!(validate_response(&config, &EvaluationResponse::MultiCriteria(complete)).is_ok());
    }

    #[test]
    fn test_pairwise_tie_and_confidence() {
        let no_ties = EvaluationConfig::Pairwise(PairwiseConfig { show_confidence: true, allow_tie: false });
        let tie = EvaluationResponse::Pairwise(PairwiseResponse { winner: Winner::Tie, confidence: None });
        assert!(validate_response(&no_ties, &tie).is_err());

        let unsure = EvaluationResponse::Pairwise(PairwiseResponse {
            winner: Winner::A,
            confidence: Some(String::new()),
        });
        assert!(validate_response(&no_ties, &unsure).is_ok());

        let bogus = EvaluationResponse::Pairwise(PairwiseResponse {
            winner: Winner::B,
            confidence: Some("certain".into()),
        });
        assert!(validate_response(&no_ties, &bogus).is_err());
    }

    #[test]
    fn test_text_clamp_and_validation() {
        let config = TextConfig { placeholder: None, max_length: Some(5), multiline: false };
        assert_eq!(config.clamp("héllo world").text, "héllo");
        assert_eq!(config.placeholder(), "Enter your response...");

        let wrapped = EvaluationConfig::Text(config);
        assert!(validate_response(&wrapped, &EvaluationResponse::Text(TextResponse { text: "   ".into() })).is_err());
        assert!(validate_response(&wrapped, &EvaluationResponse::Text(TextResponse { text: "ok".into() })).is_ok());
    }

    #[test]
    fn test_mismatched_response_kind() {
        let config = EvaluationConfig::default_for(EvaluationType::Binary);
        let err = validate_response(&config, &EvaluationResponse::Rating(RatingResponse { value: 1 })).unwrap_err();
        assert!(err.message.contains("binary"));
    }

    #[test]
    fn test_validate_config() {
        for kind in EvaluationType::ALL {
            assert!(validate_config(&EvaluationConfig::default_for(kind)).is_ok(), "{kind}");
        }

        assert!(validate_config(&EvaluationConfig::Rating(RatingConfig { min: 5, max: 5, labels: None })).is_err());
        assert!(validate_config(&EvaluationConfig::Binary(BinaryConfig {
            options: vec![ChoiceOption::new("yes", "Yes"), ChoiceOption::new("yes", "Also yes")],
        }))
        .is_err());
        assert!(validate_config(&EvaluationConfig::MultiLabel(MultiLabelConfig {
            options: vec![ChoiceOption::new("a", "A")],
            min_select: 2,
            max_select: None,
        }))
        .is_err());
        assert!(validate_config(&EvaluationConfig::MultiCriteria(MultiCriteriaConfig::default())).is_err());
    }

    #[test]
    fn test_summaries() {
        assert_eq!(EvaluationResponse::Rating(RatingResponse { value: 4 }).summary(), "4");
        assert_eq!(
            EvaluationResponse::MultiLabel(MultiLabelResponse { selected: vec!["a".into(), "b".into()] }).summary(),
            "a, b"
        );
        assert_eq!(
            EvaluationResponse::Pairwise(PairwiseResponse { winner: Winner::B, confidence: None }).summary(),
            "Winner: B"
        );

        let long = "x".repeat(60);
        let summary = EvaluationResponse::Text(TextResponse { text: long }).summary();
        assert_eq!(summary.len(), 53);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_multi_submission_keyed_like_a_field_survives_reload() {
        let sent = Submission::Multi(BTreeMap::from([
            ("criteria".to_string(), EvaluationResponse::Rating(RatingResponse { value: 3 })),
            ("notes".to_string(), EvaluationResponse::Text(TextResponse { text: "ok".to_string() })),
        ]));
        let wire = serde_json::to_value(&sent).unwrap();
        assert_eq!(wire, json!({"criteria": {"value": 3}, "notes": {"text": "ok"}}));

        let back: Submission = serde_json::from_value(wire).unwrap();
        assert_eq!(back, sent);
    }

    #[test]
    fn test_single_criteria_answer_stays_single() {
        let back: Submission = serde_json::from_value(json!({"criteria": {"quality": 4, "tone": 2}})).unwrap();
        assert_eq!(
            back,
            Submission::Single(EvaluationResponse::MultiCriteria(MultiCriteriaResponse {
                criteria: BTreeMap::from([("quality".to_string(), 4), ("tone".to_string(), 2)]),
            }))
        );

        let rating: Submission = serde_json::from_value(json!({"value": 5})).unwrap();
        assert_eq!(rating.rating_value(), Some(5));
    }

    #[test]
    fn test_criterion_keys_cannot_shadow_answer_fields() {
        let config = EvaluationConfig::MultiCriteria(MultiCriteriaConfig {
            criteria: vec![CriteriaItem { key: "value".to_string(), label: "Value".to_string(), min: 1, max: 5 }],
        });
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.field, "criteria");
    }
}
