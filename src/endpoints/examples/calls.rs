use tracing::info;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use super::{
    validate_example, validate_reorder, AnnotationExample, AnnotationExampleCreate,
    AnnotationExampleUpdate, ReorderExamplesRequest,
};

pub async fn list(client: &ApiClient, project_id: Uuid) -> Result<Vec<AnnotationExample>, ApiError> {
    let mut examples: Vec<AnnotationExample> =
        client.get_json(&format!("/projects/{project_id}/examples")).await?;
    examples.sort_by_key(|e| e.order);
    Ok(examples)
}

pub async fn get(
    client: &ApiClient,
    project_id: Uuid,
    example_id: Uuid,
) -> Result<AnnotationExample, ApiError> {
    client
        .get_json(&format!("/projects/{project_id}/examples/{example_id}"))
        .await
}

pub async fn create(
    client: &ApiClient,
    project_id: Uuid,
    request: &AnnotationExampleCreate,
) -> Result<AnnotationExample, ApiError> {
    validate_example(request)?;

    let example: AnnotationExample = client
        .post_json(&format!("/projects/{project_id}/examples"), request)
        .await?;
    info!(%project_id, title = %example.title, "example created");
    Ok(example)
}

pub async fn update(
    client: &ApiClient,
    project_id: Uuid,
    example_id: Uuid,
    request: &AnnotationExampleUpdate,
) -> Result<AnnotationExample, ApiError> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(ValidationError::new("title", "Title cannot be empty").into());
        }
    }

    client
        .patch_json(&format!("/projects/{project_id}/examples/{example_id}"), request)
        .await
}

pub async fn delete(client: &ApiClient, project_id: Uuid, example_id: Uuid) -> Result<(), ApiError> {
    client
        .delete(&format!("/projects/{project_id}/examples/{example_id}"))
        .await
}

pub async fn reorder(client: &ApiClient, project_id: Uuid, example_ids: &[Uuid]) -> Result<(), ApiError> {
    validate_reorder(example_ids)?;

    let request = ReorderExamplesRequest { example_ids: example_ids.to_vec() };
    client
        .post_empty(&format!("/projects/{project_id}/examples/reorder"), Some(&request))
        .await
}

pub async fn bulk_create(
    client: &ApiClient,
    project_id: Uuid,
    requests: &[AnnotationExampleCreate],
) -> Result<Vec<AnnotationExample>, ApiError> {
    for request in requests {
        validate_example(request)?;
    }

    client
        .post_json(&format!("/projects/{project_id}/examples/bulk"), requests)
        .await
}
