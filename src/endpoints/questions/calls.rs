use tracing::info;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;
use super::{
    validate_bulk, validate_new_question, validate_reorder, validate_update, EvaluationQuestion,
    EvaluationQuestionCreate, EvaluationQuestionUpdate, ReorderQuestionsRequest,
};

pub async fn list(client: &ApiClient, project_id: Uuid) -> Result<Vec<EvaluationQuestion>, ApiError> {
    let mut questions: Vec<EvaluationQuestion> =
        client.get_json(&format!("/projects/{project_id}/questions")).await?;
    questions.sort_by_key(|q| q.order);
    Ok(questions)
}

pub async fn get(
    client: &ApiClient,
    project_id: Uuid,
    question_id: Uuid,
) -> Result<EvaluationQuestion, ApiError> {
    client
        .get_json(&format!("/projects/{project_id}/questions/{question_id}"))
        .await
}

/// Create a question. The project's current questions are fetched to check
/// key uniqueness and conditional references.
pub async fn create(
    client: &ApiClient,
    project_id: Uuid,
    request: &EvaluationQuestionCreate,
) -> Result<EvaluationQuestion, ApiError> {
    let existing = list(client, project_id).await?;
    validate_new_question(request, &existing)?;

    let question: EvaluationQuestion = client
        .post_json(&format!("/projects/{project_id}/questions"), request)
        .await?;
    info!(%project_id, key = %question.key, "question created");
    Ok(question)
}

pub async fn update(
    client: &ApiClient,
    project_id: Uuid,
    question_id: Uuid,
    request: &EvaluationQuestionUpdate,
) -> Result<EvaluationQuestion, ApiError> {
    let siblings = list(client, project_id).await?;
    let current = get(client, project_id, question_id).await?;
    validate_update(&current, request, &siblings)?;

    client
        .patch_json(&format!("/projects/{project_id}/questions/{question_id}"), request)
        .await
}

pub async fn delete(client: &ApiClient, project_id: Uuid, question_id: Uuid) -> Result<(), ApiError> {
    client
        .delete(&format!("/projects/{project_id}/questions/{question_id}"))
        .await
}

/// Store a new display order; `question_ids` lists every question, first to last.
pub async fn reorder(client: &ApiClient, project_id: Uuid, question_ids: &[Uuid]) -> Result<(), ApiError> {
    validate_reorder(question_ids)?;

    let request = ReorderQuestionsRequest { question_ids: question_ids.to_vec() };
    client
        .post_empty(&format!("/projects/{project_id}/questions/reorder"), Some(&request))
        .await
}

pub async fn bulk_create(
    client: &ApiClient,
    project_id: Uuid,
    requests: &[EvaluationQuestionCreate],
) -> Result<Vec<EvaluationQuestion>, ApiError> {
    let existing = list(client, project_id).await?;
    validate_bulk(requests, &existing)?;

    let created: Vec<EvaluationQuestion> = client
        .post_json(&format!("/projects/{project_id}/questions/bulk"), requests)
        .await?;
    info!(%project_id, count = created.len(), "questions created");
    Ok(created)
}
