//! Cached queries and invalidating mutations over the API client.
//!
//! Every mutation drops the same query keys the web client refreshed after
//! it, so the next read goes back to the server.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::endpoints::auth::{self, AuthResponse, LoginCredentials, RegisterCredentials, User};
use crate::endpoints::examples::{self, AnnotationExample, AnnotationExampleCreate, AnnotationExampleUpdate};
use crate::endpoints::media::{self, MediaFile, MediaUploadResponse};
use crate::endpoints::projects::{self, Project, ProjectCreate, ProjectListItem, ProjectUpdate, ProjectWithQuestions, UserBasic};
use crate::endpoints::questions::{self, EvaluationQuestion, EvaluationQuestionCreate, EvaluationQuestionUpdate};
use crate::endpoints::ratings::{self, RatingCreate};
use crate::endpoints::sessions::{self, ExportFile, ExportFormat, PaginatedRows, Rating, RowFilter, SessionDetail, SessionListItem, UploadResponse};
use crate::error::ApiError;

#[derive(Clone)]
pub struct Store {
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
}

impl Store {
    pub fn new(client: ApiClient) -> Self {
        Self::with_cache(client, QueryCache::default())
    }

    pub fn with_cache(client: ApiClient, cache: QueryCache) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(cache),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.cache.put(key, &value);
        Ok(value)
    }

    /// Run a mutation and drop `keys` once it succeeds.
    async fn mutate<T, Fut>(&self, keys: &[QueryKey], mutation: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = mutation.await;
        if let Err(e) = &result {
            if e.requires_login() {
                self.cache.clear();
            }
            return result;
        }

        for key in keys {
            self.cache.invalidate(key);
        }
        result
    }

    // AUTH

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let response = auth::calls::login(&self.client, credentials).await?;
        self.cache.clear();
        Ok(response)
    }

    pub async fn register(&self, credentials: &RegisterCredentials, confirm: &str) -> Result<User, ApiError> {
        auth::calls::register(&self.client, credentials, confirm).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = auth::calls::logout(&self.client).await;
        self.cache.clear();
        result
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let result = self
            .cached(QueryKey::current_user(), || auth::calls::current_user(&self.client))
            .await;
        if matches!(&result, Err(e) if e.requires_login()) {
            self.cache.clear();
        }
        result
    }

    // PROJECTS

    pub async fn projects(&self) -> Result<Vec<ProjectListItem>, ApiError> {
        self.cached(QueryKey::projects(), || projects::calls::list(&self.client))
            .await
    }

    pub async fn project(&self, project_id: Uuid) -> Result<ProjectWithQuestions, ApiError> {
        self.cached(QueryKey::project(project_id), || projects::calls::get(&self.client, project_id))
            .await
    }

    pub async fn create_project(&self, request: &ProjectCreate) -> Result<Project, ApiError> {
        self.mutate(&[QueryKey::projects()], projects::calls::create(&self.client, request))
            .await
    }

    pub async fn update_project(&self, project_id: Uuid, request: &ProjectUpdate) -> Result<Project, ApiError> {
        self.mutate(
            &[QueryKey::projects(), QueryKey::project(project_id)],
            projects::calls::update(&self.client, project_id, request),
        )
        .await
    }

    pub async fn delete_project(&self, project_id: Uuid) -> Result<(), ApiError> {
        self.mutate(&[QueryKey::projects()], projects::calls::delete(&self.client, project_id))
            .await
    }

    pub async fn assign_raters(&self, project_id: Uuid, rater_ids: &[Uuid]) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::project(project_id)],
            projects::calls::assign_raters(&self.client, project_id, rater_ids),
        )
        .await
    }

    pub async fn remove_rater(&self, project_id: Uuid, rater_id: Uuid) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::project(project_id)],
            projects::calls::remove_rater(&self.client, project_id, rater_id),
        )
        .await
    }

    pub async fn raters(&self) -> Result<Vec<UserBasic>, ApiError> {
        self.cached(QueryKey::raters(), || projects::calls::list_raters(&self.client))
            .await
    }

    // QUESTIONS

    pub async fn questions(&self, project_id: Uuid) -> Result<Vec<EvaluationQuestion>, ApiError> {
        self.cached(QueryKey::questions(project_id), || questions::calls::list(&self.client, project_id))
            .await
    }

    pub async fn create_question(
        &self,
        project_id: Uuid,
        request: &EvaluationQuestionCreate,
    ) -> Result<EvaluationQuestion, ApiError> {
        self.mutate(
            &[QueryKey::questions(project_id), QueryKey::project(project_id)],
            questions::calls::create(&self.client, project_id, request),
        )
        .await
    }

    pub async fn update_question(
        &self,
        project_id: Uuid,
        question_id: Uuid,
        request: &EvaluationQuestionUpdate,
    ) -> Result<EvaluationQuestion, ApiError> {
        self.mutate(
            &[QueryKey::questions(project_id), QueryKey::project(project_id)],
            questions::calls::update(&self.client, project_id, question_id, request),
        )
        .await
    }

    pub async fn delete_question(&self, project_id: Uuid, question_id: Uuid) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::questions(project_id), QueryKey::project(project_id)],
            questions::calls::delete(&self.client, project_id, question_id),
        )
        .await
    }

    pub async fn reorder_questions(&self, project_id: Uuid, question_ids: &[Uuid]) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::questions(project_id)],
            questions::calls::reorder(&self.client, project_id, question_ids),
        )
        .await
    }

    pub async fn bulk_create_questions(
        &self,
        project_id: Uuid,
        requests: &[EvaluationQuestionCreate],
    ) -> Result<Vec<EvaluationQuestion>, ApiError> {
        self.mutate(
            &[QueryKey::questions(project_id), QueryKey::project(project_id)],
            questions::calls::bulk_create(&self.client, project_id, requests),
        )
        .await
    }

    // EXAMPLES

    pub async fn examples(&self, project_id: Uuid) -> Result<Vec<AnnotationExample>, ApiError> {
        self.cached(QueryKey::examples(project_id), || examples::calls::list(&self.client, project_id))
            .await
    }

    pub async fn create_example(
        &self,
        project_id: Uuid,
        request: &AnnotationExampleCreate,
    ) -> Result<AnnotationExample, ApiError> {
        self.mutate(
            &[QueryKey::examples(project_id)],
            examples::calls::create(&self.client, project_id, request),
        )
        .await
    }

    pub async fn update_example(
        &self,
        project_id: Uuid,
        example_id: Uuid,
        request: &AnnotationExampleUpdate,
    ) -> Result<AnnotationExample, ApiError> {
        self.mutate(
            &[QueryKey::examples(project_id)],
            examples::calls::update(&self.client, project_id, example_id, request),
        )
        .await
    }

    pub async fn delete_example(&self, project_id: Uuid, example_id: Uuid) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::examples(project_id)],
            examples::calls::delete(&self.client, project_id, example_id),
        )
        .await
    }

    pub async fn reorder_examples(&self, project_id: Uuid, example_ids: &[Uuid]) -> Result<(), ApiError> {
        self.mutate(
            &[QueryKey::examples(project_id)],
            examples::calls::reorder(&self.client, project_id, example_ids),
        )
        .await
    }

    pub async fn bulk_create_examples(
        &self,
        project_id: Uuid,
        requests: &[AnnotationExampleCreate],
    ) -> Result<Vec<AnnotationExample>, ApiError> {
        self.mutate(
            &[QueryKey::examples(project_id)],
            examples::calls::bulk_create(&self.client, project_id, requests),
        )
        .await
    }

    // SESSIONS

    pub async fn project_sessions(&self, project_id: Uuid) -> Result<Vec<SessionListItem>, ApiError> {
        self.cached(QueryKey::project_sessions(project_id), || {
            sessions::calls::list_for_project(&self.client, project_id)
        })
        .await
    }

    pub async fn session(&self, session_id: Uuid) -> Result<SessionDetail, ApiError> {
        self.cached(QueryKey::session(session_id), || sessions::calls::get(&self.client, session_id))
            .await
    }

    pub async fn rows(
        &self,
        session_id: Uuid,
        page: u32,
        per_page: u32,
        filter: RowFilter,
    ) -> Result<PaginatedRows, ApiError> {
        self.cached(QueryKey::rows(session_id, page, per_page, filter), || {
            sessions::calls::rows(&self.client, session_id, page, per_page, filter)
        })
        .await
    }

    /// Re-read a row page, bypassing the cache.
    pub async fn refetch_rows(
        &self,
        session_id: Uuid,
        page: u32,
        per_page: u32,
        filter: RowFilter,
    ) -> Result<PaginatedRows, ApiError> {
        self.cache.invalidate(&QueryKey::rows(session_id, page, per_page, filter));
        self.rows(session_id, page, per_page, filter).await
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<(), ApiError> {
        self.mutate(&[QueryKey::sessions()], sessions::calls::delete(&self.client, session_id))
            .await
    }

    pub async fn upload_dataset(
        &self,
        project_id: Uuid,
        path: &Path,
        session_name: Option<&str>,
    ) -> Result<UploadResponse, ApiError> {
        self.mutate(
            &[QueryKey::project_sessions(project_id), QueryKey::project(project_id)],
            sessions::calls::upload(&self.client, project_id, path, session_name),
        )
        .await
    }

    pub async fn export_session(&self, session_id: Uuid, format: ExportFormat) -> Result<ExportFile, ApiError> {
        sessions::calls::export(&self.client, session_id, format).await
    }

    pub async fn submit_rating(&self, request: &RatingCreate) -> Result<Rating, ApiError> {
        let session_id = request.session_id;
        self.mutate(
            &[QueryKey::session_rows(session_id), QueryKey::session(session_id)],
            ratings::calls::submit(&self.client, request),
        )
        .await
    }

    // MEDIA

    pub async fn media(&self, project_id: Uuid) -> Result<Vec<MediaFile>, ApiError> {
        self.cached(QueryKey::media(project_id), || media::calls::list_for_project(&self.client, project_id))
            .await
    }

    pub async fn upload_media(&self, project_id: Uuid, paths: &[PathBuf]) -> Result<MediaUploadResponse, ApiError> {
        self.mutate(
            &[QueryKey::media(project_id)],
            media::calls::upload(&self.client, project_id, paths),
        )
        .await
    }

    pub async fn delete_media(&self, project_id: Uuid, media_id: Uuid) -> Result<(), ApiError> {
        self.mutate(&[QueryKey::media(project_id)], media::calls::delete(&self.client, media_id))
            .await
    }
}
