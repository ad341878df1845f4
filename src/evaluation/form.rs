use std::collections::{BTreeMap, HashSet};

use super::visibility::{is_visible, Conditional};
use super::{validate_response, EvaluationConfig, EvaluationResponse, Submission};
use crate::error::ValidationError;

/// A question as the form needs it: typed config plus display fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FormQuestion {
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    pub config: EvaluationConfig,
    pub required: bool,
    pub conditional: Option<Conditional>,
    pub order: i32,
}

/// Composed form over several questions with conditional visibility.
#[derive(Debug, Clone, Default)]
pub struct MultiQuestionForm {
    questions: Vec<FormQuestion>,
    answers: BTreeMap<String, EvaluationResponse>,
}

impl MultiQuestionForm {
    pub fn new(mut questions: Vec<FormQuestion>) -> Self {
        questions.sort_by_key(|q| q.order);
        Self {
            questions,
            answers: BTreeMap::new(),
        }
    }

    pub fn questions(&self) -> &[FormQuestion] {
        &self.questions
    }

    pub fn question(&self, key: &str) -> Option<&FormQuestion> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn answers(&self) -> &BTreeMap<String, EvaluationResponse> {
        &self.answers
    }

    pub fn load(&mut self, answers: BTreeMap<String, EvaluationResponse>) {
        self.answers = answers;
    }

    pub fn reset(&mut self) {
        self.answers.clear();
    }

    /// Record an answer. Bounds are checked on submit, the kind is checked here.
    pub fn answer(&mut self, key: &str, response: EvaluationResponse) -> Result<(), ValidationError> {
        let question = self
            .question(key)
            .ok_or_else(|| ValidationError::new(key, "No such question"))?;

        if question.config.kind() != response.kind() {
            return Err(ValidationError::new(
                key,
                format!("Expected a {} answer, got {}", question.config.kind(), response.kind()),
            ));
        }

        self.answers.insert(key.to_string(), response);
        Ok(())
    }

    pub fn clear(&mut self, key: &str) {
        self.answers.remove(key);
    }

    /// Keys of the questions currently shown.
    ///
    /// Answers to hidden questions do not count towards other questions'
    /// conditions, so the set is narrowed until it stops changing.
    fn visible_keys(&self) -> HashSet<&str> {
        let mut effective = self.answers.clone();

        loop {
            let visible: HashSet<&str> = self
                .questions
                .iter()
                .filter(|q| is_visible(q.conditional.as_ref(), &effective))
                .map(|q| q.key.as_str())
                .collect();

            let before = effective.len();
            effective.retain(|key, _| visible.contains(key.as_str()));
            if effective.len() == before {
                return visible;
            }
        }
    }

    pub fn visible_questions(&self) -> Vec<&FormQuestion> {
        let visible = self.visible_keys();
        self.questions
            .iter()
            .filter(|q| visible.contains(q.key.as_str()))
            .collect()
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible_keys().contains(key)
    }

    /// Visible, required questions without an answer.
    pub fn missing_required(&self) -> Vec<&FormQuestion> {
        self.visible_questions()
            .into_iter()
            .filter(|q| q.required && !self.answers.contains_key(&q.key))
            .collect()
    }

    /// Validation failures among the visible answers.
    pub fn errors(&self) -> Vec<ValidationError> {
        self.visible_questions()
            .into_iter()
            .filter_map(|q| {
                let answer = self.answers.get(&q.key)?;
                validate_response(&q.config, answer)
                    .err()
                    .map(|e| ValidationError::new(q.key.as_str(), e.message))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(missing) = self.missing_required().first() {
            return Err(ValidationError::new(
                missing.key.as_str(),
                format!("{} is required", missing.label),
            ));
        }
        match self.errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Answers to submit. Answers to hidden questions are left out.
    pub fn submission(&self) -> Option<Submission> {
        let visible = self.visible_keys();
        let answers: BTreeMap<String, EvaluationResponse> = self
            .answers
            .iter()
            .filter(|(key, _)| visible.contains(key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if answers.is_empty() {
            None
        } else {
            Some(Submission::Multi(answers))
        }
    }
}

/// The evaluation area of the rating desk: one configured question, or a
/// multi-question form.
#[derive(Debug, Clone)]
pub enum EvaluationForm {
    Single {
        config: EvaluationConfig,
        response: Option<EvaluationResponse>,
    },
    Multi(MultiQuestionForm),
}

impl EvaluationForm {
    pub fn single(config: EvaluationConfig) -> Self {
        EvaluationForm::Single { config, response: None }
    }

    /// Replace the draft with a previously saved submission, or clear it.
    pub fn load(&mut self, submission: Option<&Submission>) {
        match (self, submission) {
            (EvaluationForm::Single { response, .. }, Some(Submission::Single(saved))) => {
                *response = Some(saved.clone());
            }
            (EvaluationForm::Multi(form), Some(Submission::Multi(saved))) => {
                form.load(saved.clone());
            }
            (EvaluationForm::Single { response, .. }, _) => *response = None,
            (EvaluationForm::Multi(form), _) => form.reset(),
        }
    }

    /// Set an answer. `key` names the question in multi-question mode and is ignored otherwise.
    pub fn answer(&mut self, key: Option<&str>, answer: EvaluationResponse) -> Result<(), ValidationError> {
        match self {
            EvaluationForm::Single { config, response } => {
                if config.kind() != answer.kind() {
                    return Err(ValidationError::new(
                        "response",
                        format!("Expected a {} answer, got {}", config.kind(), answer.kind()),
                    ));
                }
                *response = Some(answer);
                Ok(())
            }
            EvaluationForm::Multi(form) => {
                let key = key.ok_or_else(|| ValidationError::new("question", "Name the question to answer"))?;
                form.answer(key, answer)
            }
        }
    }

    pub fn submission(&self) -> Option<Submission> {
        match self {
            EvaluationForm::Single { response, .. } => response.clone().map(Submission::Single),
            EvaluationForm::Multi(form) => form.submission(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            EvaluationForm::Single { config, response } => match response {
                Some(answer) => validate_response(config, answer),
                None => Err(ValidationError::new("response", "No response given")),
            },
            EvaluationForm::Multi(form) => form.validate(),
        }
    }
}
