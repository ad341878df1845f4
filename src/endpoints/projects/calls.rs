use tracing::info;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use super::{
    validate_create, validate_update, AssignRatersRequest, Project, ProjectCreate,
    ProjectListItem, ProjectUpdate, ProjectWithQuestions, UserBasic,
};

/// Projects visible to the current user: owned ones for requesters, assigned ones for raters.
pub async fn list(client: &ApiClient) -> Result<Vec<ProjectListItem>, ApiError> {
    client.get_json("/projects").await
}

pub async fn get(client: &ApiClient, project_id: Uuid) -> Result<ProjectWithQuestions, ApiError> {
    client.get_json(&format!("/projects/{project_id}")).await
}

pub async fn create(client: &ApiClient, request: &ProjectCreate) -> Result<Project, ApiError> {
    validate_create(request)?;

    let project: Project = client.post_json("/projects", request).await?;
    info!(project_id = %project.id, name = %project.name, "project created");
    Ok(project)
}

pub async fn update(
    client: &ApiClient,
    project_id: Uuid,
    request: &ProjectUpdate,
) -> Result<Project, ApiError> {
    validate_update(request)?;
    client.patch_json(&format!("/projects/{project_id}"), request).await
}

pub async fn delete(client: &ApiClient, project_id: Uuid) -> Result<(), ApiError> {
    client.delete(&format!("/projects/{project_id}")).await?;
    info!(%project_id, "project deleted");
    Ok(())
}

pub async fn assign_raters(
    client: &ApiClient,
    project_id: Uuid,
    rater_ids: &[Uuid],
) -> Result<(), ApiError> {
    if rater_ids.is_empty() {
        return Err(ValidationError::new("rater_ids", "Select at least one rater").into());
    }

    let request = AssignRatersRequest { rater_ids: rater_ids.to_vec() };
    client.post_empty(&format!("/projects/{project_id}/assign"), Some(&request)).await
}

pub async fn remove_rater(client: &ApiClient, project_id: Uuid, rater_id: Uuid) -> Result<(), ApiError> {
    client.delete(&format!("/projects/{project_id}/raters/{rater_id}")).await
}

/// Every rater account, for the assignment picker.
pub async fn list_raters(client: &ApiClient) -> Result<Vec<UserBasic>, ApiError> {
    client.get_json("/users/raters").await
}
