//! Recognise media references inside dataset cells.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde_json::{Map, Value};
use std::fmt;

pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "webm", "ogg", "mov", "avi"];
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "aac", "flac", "webm"];
pub const PDF_EXTENSIONS: [&str; 1] = ["pdf"];

const MEDIA_SCHEME: &str = "media://";

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)([a-zA-Z0-9_-]{11})")
        .expect("Valid YouTube regex")
});

static VIMEO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(\d+)").expect("Valid Vimeo regex"));

static DATA_MIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;,]+)").expect("Valid data URL regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
    Youtube,
    Vimeo,
    Link,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Pdf => "pdf",
            MediaKind::Youtube => "youtube",
            MediaKind::Vimeo => "vimeo",
            MediaKind::Link => "link",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedMedia {
    pub kind: MediaKind,
    /// Where to load the media from; an embed URL for YouTube and Vimeo.
    pub url: String,
    pub original: String,
}

impl DetectedMedia {
    fn new(kind: MediaKind, url: impl Into<String>, original: &str) -> Self {
        Self { kind, url: url.into(), original: original.to_string() }
    }
}

/// URL of an uploaded media file.
pub fn media_url(api_url: &str, media_id: &str) -> String {
    format!("{}/media/{}", api_url.trim_end_matches('/'), media_id)
}

/// Classify a cell value. `None` means the value is plain text.
///
/// `api_url` resolves `media://<id>` references to uploaded files.
pub fn detect_media(value: &str, api_url: &str) -> Option<DetectedMedia> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(media_id) = trimmed.strip_prefix(MEDIA_SCHEME) {
        // The real type is only known once the file is fetched.
        return Some(DetectedMedia::new(MediaKind::Image, media_url(api_url, media_id), trimmed));
    }

    if trimmed.starts_with("data:") {
        let mime = DATA_MIME.captures(trimmed)?.get(1)?.as_str();
        let kind = if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else if mime.starts_with("audio/") {
            MediaKind::Audio
        } else {
            return None;
        };
        return Some(DetectedMedia::new(kind, trimmed, trimmed));
    }

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return None;
    }

    if let Some(id) = YOUTUBE.captures(trimmed).and_then(|c| c.get(1)) {
        return Some(DetectedMedia::new(
            MediaKind::Youtube,
            format!("https://www.youtube.com/embed/{}", id.as_str()),
            trimmed,
        ));
    }

    if let Some(id) = VIMEO.captures(trimmed).and_then(|c| c.get(1)) {
        return Some(DetectedMedia::new(
            MediaKind::Vimeo,
            format!("https://player.vimeo.com/video/{}", id.as_str()),
            trimmed,
        ));
    }

    let kind = url_extension(trimmed)
        .and_then(|ext| kind_for_extension(&ext))
        .unwrap_or(MediaKind::Link);
    Some(DetectedMedia::new(kind, trimmed, trimmed))
}

/// Lower-cased extension of the URL path, ignoring query and fragment.
fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path().rsplit('/').next()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

/// Video is checked before audio, so `ogg` and `webm` count as video.
pub fn kind_for_extension(ext: &str) -> Option<MediaKind> {
    let ext = ext.to_lowercase();
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Audio)
    } else if PDF_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Pdf)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentCell {
    pub key: String,
    pub value: String,
    pub media: Option<DetectedMedia>,
}

/// Cells of a data row, in the session's column order first, then any
/// remaining keys.
pub fn parse_row_content(content: &Map<String, Value>, columns: &[String], api_url: &str) -> Vec<ContentCell> {
    let ordered = columns
        .iter()
        .filter(|column| content.contains_key(column.as_str()))
        .map(String::as_str);
    let remaining = content
        .keys()
        .map(String::as_str)
        .filter(|key| !columns.iter().any(|c| c == key));

    ordered
        .chain(remaining)
        .map(|key| {
            let value = cell_text(content.get(key).unwrap_or(&Value::Null));
            ContentCell {
                key: key.to_string(),
                media: detect_media(&value, api_url),
                value,
            }
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `m:ss`, or `h:mm:ss` from one hour up. Negative input counts as zero.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const API: &str = "http://localhost:8000/api";

    fn kind(value: &str) -> Option<MediaKind> {
        detect_media(value, API).map(|m| m.kind)
    }

    #[test]
    fn test_media_reference() {
        let media = detect_media("  media://abc-123 ", API).unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.url, "http://localhost:8000/api/media/abc-123");
        assert_eq!(media.original, "media://abc-123");
    }

    #[test]
    fn test_data_urls() {
        assert_eq!(kind("data:image/png;base64,AAAA"), Some(MediaKind::Image));
        assert_eq!(kind("data:audio/wav;base64,AAAA"), Some(MediaKind::Audio));
        assert_eq!(kind("data:video/mp4;base64,AAAA"), Some(MediaKind::Video));
        assert_eq!(kind("data:text/plain;base64,AAAA"), None);
    }

    #[test]
    fn test_youtube_and_vimeo() {
        let yt = detect_media("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10", API).unwrap();
        assert_eq!(yt.kind, MediaKind::Youtube);
        assert_eq!(yt.url, "https://www.youtube.com/embed/dQw4w9WgXcQ");

        let short = detect_media("https://youtu.be/dQw4w9WgXcQ", API).unwrap();
        assert_eq!(short.url, "https://www.youtube.com/embed/dQw4w9WgXcQ");

        let vimeo = detect_media("https://vimeo.com/76979871", API).unwrap();
        assert_eq!(vimeo.kind, MediaKind::Vimeo);
        assert_eq!(vimeo.url, "https://player.vimeo.com/video/76979871");
    }

    #[test]
    fn test_extensions_from_path() {
        assert_eq!(kind("https://cdn.example.com/cat.JPG?size=large"), Some(MediaKind::Image));
        assert_eq!(kind("https://cdn.example.com/clip.ogg"), Some(MediaKind::Video));
        assert_eq!(kind("https://cdn.example.com/clip.webm"), Some(MediaKind::Video));
        assert_eq!(kind("https://cdn.example.com/song.flac"), Some(MediaKind::Audio));
        assert_eq!(kind("https://cdn.example.com/paper.pdf#page=2"), Some(MediaKind::Pdf));
        assert_eq!(kind("https://example.com/page.html"), Some(MediaKind::Link));
        assert_eq!(kind("https://example.com/"), Some(MediaKind::Link));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kind("What is the capital of France?"), None);
        assert_eq!(kind("ftp://example.com/file.png"), None);
        assert_eq!(kind("   "), None);
    }

    #[test]
    fn test_parse_row_content_orders_columns() {
        let content = json!({
            "zeta": 1,
            "response": "https://cdn.example.com/a.png",
            "prompt": "Describe",
            "extra": null
        });
        let columns = vec!["prompt".to_string(), "response".to_string(), "missing".to_string()];
        let cells = parse_row_content(content.as_object().unwrap(), &columns, API);

        let keys: Vec<&str> = cells.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["prompt", "response", "extra", "zeta"]);
        assert_eq!(cells[1].media.as_ref().map(|m| m.kind), Some(MediaKind::Image));
        assert_eq!(cells[2].value, "");
        assert_eq!(cells[3].value, "1");
        assert!(cells[0].media.is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.7), "1:05");
        assert_eq!(format_duration(3600.0), "1:00:00");
        assert_eq!(format_duration(3725.0), "1:02:05");
        assert_eq!(format_duration(-3.0), "0:00");
    }
}
