pub mod calls;

use serde::Serialize;
use uuid::Uuid;

use crate::evaluation::Submission;

/// Create-or-update payload; the backend keeps one rating per rater and row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCreate {
    pub data_row_id: Uuid,
    pub session_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Submission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_ms: Option<u64>,
}

impl RatingCreate {
    /// A single rating answer is also sent as `rating_value` so exports keep a numeric column.
    pub fn new(data_row_id: Uuid, session_id: Uuid, response: Submission) -> Self {
        Self {
            data_row_id,
            session_id,
            rating_value: response.rating_value(),
            response: Some(response),
            comment: None,
            time_spent_ms: None,
        }
    }

    /// Blank comments are dropped.
    pub fn with_comment(mut self, comment: &str) -> Self {
        let comment = comment.trim();
        self.comment = (!comment.is_empty()).then(|| comment.to_string());
        self
    }

    pub fn with_time_spent_ms(mut self, millis: u64) -> Self {
        self.time_spent_ms = Some(millis);
        self
    }
}
