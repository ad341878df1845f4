use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::EvaluationResponse;

/// Show a question only when an earlier answer matches `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub question: String,
    pub equals: Value,
}

impl Conditional {
    pub fn new(question: &str, equals: impl Into<Value>) -> Self {
        Self {
            question: question.to_string(),
            equals: equals.into(),
        }
    }
}

/// Decide whether a question is shown given the answers collected so far.
///
/// The answer to the referenced question is inspected by kind: `value` for
/// rating and binary, membership in `selected` for multi-label, `text`,
/// `winner`. A multi-criteria answer never satisfies a condition.
pub fn is_visible(
    conditional: Option<&Conditional>,
    answers: &BTreeMap<String, EvaluationResponse>,
) -> bool {
    let Some(conditional) = conditional else {
        return true;
    };

    let Some(answer) = answers.get(&conditional.question) else {
        return false;
    };

    let expected = &conditional.equals;
    match answer {
        EvaluationResponse::Rating(r) => loose_eq(expected, &Value::from(r.value)),
        EvaluationResponse::Binary(b) => loose_eq(expected, &Value::from(b.value.as_str())),
        EvaluationResponse::MultiLabel(m) => match scalar_text(expected) {
            Some(wanted) => m.selected.iter().any(|s| *s == wanted),
            None => false,
        },
        EvaluationResponse::Text(t) => scalar_text(expected).is_some_and(|wanted| t.text == wanted),
        EvaluationResponse::Pairwise(p) => {
            scalar_text(expected).is_some_and(|wanted| p.winner.as_str() == wanted)
        }
        EvaluationResponse::MultiCriteria(_) => false,
    }
}

/// Equality across JSON scalars. The question editor stores `equals` as a
/// string, so `"3"` has to match a rating of `3` and `"true"` a `true`.
fn loose_eq(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }

    match (scalar_text(expected), scalar_text(actual)) {
        (Some(a), Some(b)) if a == b => true,
        (Some(a), Some(b)) => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
