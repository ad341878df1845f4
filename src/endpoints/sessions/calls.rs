use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::info;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::MAX_PER_PAGE;
use crate::error::{ApiError, ValidationError};
use super::{
    dataset_mime, export_file_name, validate_dataset_file, ExportFile, ExportFormat, PaginatedRows,
    RowFilter, SessionDetail, SessionListItem, UploadResponse,
};

pub async fn list_for_project(client: &ApiClient, project_id: Uuid) -> Result<Vec<SessionListItem>, ApiError> {
    client.get_json(&format!("/projects/{project_id}/sessions")).await
}

pub async fn get(client: &ApiClient, session_id: Uuid) -> Result<SessionDetail, ApiError> {
    client.get_json(&format!("/sessions/{session_id}")).await
}

pub async fn delete(client: &ApiClient, session_id: Uuid) -> Result<(), ApiError> {
    client.delete(&format!("/sessions/{session_id}")).await?;
    info!(%session_id, "session deleted");
    Ok(())
}

/// One page of rows. Pages start at 1.
pub async fn rows(
    client: &ApiClient,
    session_id: Uuid,
    page: u32,
    per_page: u32,
    filter: RowFilter,
) -> Result<PaginatedRows, ApiError> {
    if page == 0 {
        return Err(ValidationError::new("page", "Pages start at 1").into());
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ValidationError::new("per_page", format!("per_page must be between 1 and {MAX_PER_PAGE}")).into());
    }

    let params = [
        ("page", page.to_string()),
        ("per_page", per_page.to_string()),
        ("filter", filter.as_str().to_string()),
    ];
    client
        .get_json_query(&format!("/sessions/{session_id}/rows"), &params)
        .await
}

/// Upload a dataset file as a new session of the project.
pub async fn upload(
    client: &ApiClient,
    project_id: Uuid,
    path: &Path,
    session_name: Option<&str>,
) -> Result<UploadResponse, ApiError> {
    validate_dataset_file(path)?;

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dataset")
        .to_string();

    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(dataset_mime(path))?;
    let mut form = Form::new().part("file", part);
    if let Some(name) = session_name.map(str::trim).filter(|n| !n.is_empty()) {
        form = form.text("session_name", name.to_string());
    }

    let response: UploadResponse = client
        .post_multipart(&format!("/projects/{project_id}/upload"), form)
        .await?;
    info!(
        %project_id,
        session_id = %response.session_id,
        rows = response.row_count,
        "dataset uploaded"
    );
    Ok(response)
}

/// Download the session with its ratings.
pub async fn export(
    client: &ApiClient,
    session_id: Uuid,
    format: ExportFormat,
) -> Result<ExportFile, ApiError> {
    let session = get(client, session_id).await?;
    let bytes = client
        .get_bytes(
            &format!("/sessions/{session_id}/export"),
            &[("format", format.extension().to_string())],
        )
        .await?;

    Ok(ExportFile {
        file_name: export_file_name(&session.session.name, format),
        bytes,
    })
}
