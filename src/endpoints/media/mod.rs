pub mod calls;

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::media::{kind_for_extension, MediaKind};
use crate::timestamp::Timestamp;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

// MODELS

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub storage_path: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: Timestamp,
}

impl MediaFile {
    /// The reference to paste into a dataset cell.
    pub fn reference(&self) -> String {
        format!("media://{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub files: Vec<MediaFile>,
    #[serde(default)]
    pub message: String,
}

// HELPER FUNCTIONS

/// Human file size in powers of 1024, at most two decimals: `0 Bytes`, `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{size:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Content type sent with an uploaded file, from its extension.
pub fn upload_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match (kind_for_extension(&ext), ext.as_str()) {
        (Some(MediaKind::Image), "jpg" | "jpeg") => "image/jpeg",
        (Some(MediaKind::Image), "svg") => "image/svg+xml",
        (Some(MediaKind::Image), "png") => "image/png",
        (Some(MediaKind::Image), "gif") => "image/gif",
        (Some(MediaKind::Image), "webp") => "image/webp",
        (Some(MediaKind::Image), "bmp") => "image/bmp",
        (Some(MediaKind::Video), "mp4") => "video/mp4",
        (Some(MediaKind::Video), "webm") => "video/webm",
        (Some(MediaKind::Video), "ogg") => "video/ogg",
        (Some(MediaKind::Video), "mov") => "video/quicktime",
        (Some(MediaKind::Video), "avi") => "video/x-msvideo",
        (Some(MediaKind::Audio), "mp3") => "audio/mpeg",
        (Some(MediaKind::Audio), "wav") => "audio/wav",
        (Some(MediaKind::Audio), "aac") => "audio/aac",
        (Some(MediaKind::Audio), "flac") => "audio/flac",
        (Some(MediaKind::Pdf), _) => "application/pdf",
        _ => "application/octet-stream",
    }
}
