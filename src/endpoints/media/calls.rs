use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use tracing::info;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use super::{upload_mime, MediaFile, MediaUploadResponse};

/// Upload files to the project's media library in one request.
pub async fn upload(
    client: &ApiClient,
    project_id: Uuid,
    paths: &[PathBuf],
) -> Result<MediaUploadResponse, ApiError> {
    if paths.is_empty() {
        return Err(ValidationError::new("files", "Choose at least one file").into());
    }

    let mut form = Form::new();
    for path in paths {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let part = Part::bytes(bytes).file_name(file_name).mime_str(upload_mime(path))?;
        form = form.part("files", part);
    }

    let response: MediaUploadResponse = client
        .post_multipart(&format!("/projects/{project_id}/media"), form)
        .await?;
    info!(%project_id, count = response.files.len(), "media uploaded");
    Ok(response)
}

pub async fn list_for_project(client: &ApiClient, project_id: Uuid) -> Result<Vec<MediaFile>, ApiError> {
    client.get_json(&format!("/projects/{project_id}/media")).await
}

pub async fn info(client: &ApiClient, media_id: Uuid) -> Result<MediaFile, ApiError> {
    client.get_json(&format!("/media/{media_id}/info")).await
}

pub async fn delete(client: &ApiClient, media_id: Uuid) -> Result<(), ApiError> {
    client.delete(&format!("/media/{media_id}")).await
}

/// Where the file itself is served.
pub fn media_url(client: &ApiClient, media_id: Uuid) -> String {
    crate::media::media_url(client.base_url().as_str(), &media_id.to_string())
}
