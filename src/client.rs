//! HTTP plumbing shared by every endpoint module.
//!
//! The backend authenticates with an http-only `session_id` cookie. The
//! cookie jar is persisted to the session file after login so later
//! invocations reuse it; any 401 drops the persisted copy.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{detail_from_body, ApiError};

pub const SESSION_COOKIE: &str = "session_id";

/// Queries are retried this many times on transport errors and 5xx responses.
pub const QUERY_RETRIES: u32 = 1;

pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    session_file: PathBuf,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base = parse_base(&config.api_url)?;
        let jar = Arc::new(Jar::default());

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout())
            .build()?;

        let client = Self {
            http,
            jar,
            base,
            session_file: config.session_file.clone(),
        };
        client.restore_session()?;
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    // SESSION

    pub fn has_session(&self) -> bool {
        self.session_cookie().is_some()
    }

    fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .map(str::trim)
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
            .map(str::to_string)
    }

    fn restore_session(&self) -> Result<(), ApiError> {
        if !self.session_file.exists() {
            return Ok(());
        }

        let saved = fs::read_to_string(&self.session_file)?;
        for pair in saved.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(&format!("{pair}; Path=/"), &self.base);
        }
        debug!(path = %self.session_file.display(), "restored session cookie");
        Ok(())
    }

    /// Write the current session cookie to disk. Returns false if the server never set one.
    pub fn persist_session(&self) -> Result<bool, ApiError> {
        let Some(cookie) = self.session_cookie() else {
            warn!("login succeeded but no session cookie was set");
            return Ok(false);
        };

        if let Some(parent) = self.session_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.session_file, cookie)?;
        debug!(path = %self.session_file.display(), "persisted session cookie");
        Ok(true)
    }

    pub fn clear_session(&self) -> Result<(), ApiError> {
        self.jar.add_cookie_str(
            &format!("{SESSION_COOKIE}=; Max-Age=0; Path=/"),
            &self.base,
        );
        if self.session_file.exists() {
            fs::remove_file(&self.session_file)?;
        }
        Ok(())
    }

    // QUERIES

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_json_query(path, &[]).await
    }

    pub async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.query(path, params).await?;
        decode(response).await
    }

    pub async fn get_bytes(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.query(path, params).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn query(&self, path: &str, params: &[(&str, String)]) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");

            match self.http.get(url.clone()).query(params).send().await {
                Ok(response) if response.status().is_server_error() && attempt <= QUERY_RETRIES => {
                    warn!(%url, status = %response.status(), "query failed, retrying");
                }
                Ok(response) => return self.check(response).await,
                Err(e) if attempt <= QUERY_RETRIES => {
                    warn!(%url, error = %e, "query failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // MUTATIONS

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)?).json(body);
        let response = self.mutate("POST", request).await?;
        decode(response).await
    }

    /// POST whose response body carries nothing we need.
    pub async fn post_empty<B>(&self, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(self.url(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.mutate("POST", request).await?;
        Ok(())
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.patch(self.url(path)?).json(body);
        let response = self.mutate("PATCH", request).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(path)?);
        self.mutate("DELETE", request).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)?).multipart(form);
        let response = self.mutate("POST", request).await?;
        decode(response).await
    }

    async fn mutate(&self, method: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        debug!(method, url = %response.url(), status = %response.status(), "mutation");
        self.check(response).await
    }

    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = detail_from_body(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                warn!("server rejected the session, clearing stored session");
                if let Err(e) = self.clear_session() {
                    warn!(error = %e, "could not remove stored session");
                }
                ApiError::Unauthorized { detail }
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden { detail },
            StatusCode::NOT_FOUND => ApiError::NotFound { detail },
            other => ApiError::Status {
                status: other.as_u16(),
                detail,
            },
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn parse_base(api_url: &str) -> Result<Url, ApiError> {
    // A trailing slash makes `Url::join` append instead of replacing the last segment.
    let with_slash = format!("{}/", api_url.trim_end_matches('/'));
    let url = Url::parse(&with_slash).map_err(|e| ApiError::InvalidUrl(format!("{api_url}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ApiError::InvalidUrl(format!(
            "{api_url}: unsupported scheme {scheme}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(api_url: &str, session_file: PathBuf) -> Config {
        Config {
            api_url: api_url.to_string(),
            timeout_secs: 5,
            per_page: 10,
            session_file,
        }
    }

    #[test]
    fn test_url_join_keeps_api_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let client = ApiClient::new(&config_for("http://localhost:8000/api", dir.path().join("s"))).unwrap();

        assert_eq!(
            client.url("/projects/abc/questions").unwrap().as_str(),
            "http://localhost:8000/api/projects/abc/questions"
        );
        assert_eq!(client.url("ratings").unwrap().as_str(), "http://localhost:8000/api/ratings");
    }

    #[test]
    fn test_rejects_non_http_base() {
        let dir = tempfile::tempdir().unwrap();
        let result = ApiClient::new(&config_for("ftp://example.com/api", dir.path().join("s")));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_restore_and_clear_session() {
        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session");
        fs::write(&session_file, "session_id=abc123").unwrap();

        let client = ApiClient::new(&config_for("http://localhost:8000/api", session_file.clone())).unwrap();
        assert!(client.has_session());
        assert_eq!(client.session_cookie().as_deref(), Some("session_id=abc123"));

        client.clear_session().unwrap();
        assert!(!client.has_session());
        assert!(!session_file.exists());
    }

    #[test]
    fn test_persist_without_cookie_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("nested").join("session");
        let client = ApiClient::new(&config_for("http://localhost:8000/api", session_file.clone())).unwrap();

        assert!(!client.persist_session().unwrap());
        assert!(!session_file.exists());
    }
}
