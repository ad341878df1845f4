//! End-to-end client behavior against an in-process stand-in backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use hitl_desk::desk::{DeskError, RatingDesk, SaveOutcome, Step};
use hitl_desk::endpoints::auth::LoginCredentials;
use hitl_desk::endpoints::sessions::{ExportFormat, RowFilter};
use hitl_desk::evaluation::{EvaluationResponse, RatingResponse};
use hitl_desk::{ApiClient, ApiError, Config, Store};

const TOKEN: &str = "tok-123";
const PASSWORD: &str = "secret1";

struct Backend {
    user_id: Uuid,
    session_id: Uuid,
    project_id: Uuid,
    row_ids: Vec<Uuid>,
    flaky_gets: AtomicUsize,
    failing_posts: AtomicUsize,
    ratings: Mutex<HashMap<Uuid, Value>>,
    rows_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Backend {
    fn new(rows: usize) -> Arc<Self> {
        Arc::new(Self {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            row_ids: (0..rows).map(|_| Uuid::new_v4()).collect(),
            flaky_gets: AtomicUsize::new(0),
            failing_posts: AtomicUsize::new(0),
            ratings: Mutex::new(HashMap::new()),
            rows_queries: Mutex::new(Vec::new()),
        })
    }

    fn user(&self) -> Value {
        json!({
            "id": self.user_id,
            "username": "alice",
            "role": "rater",
            "created_at": "2024-05-01T10:00:00"
        })
    }

    fn session(&self) -> Value {
        json!({
            "id": self.session_id,
            "name": "Batch 1",
            "filename": "batch1.csv",
            "columns": ["prompt"],
            "project_id": self.project_id,
            "created_at": "2024-05-01T10:00:00",
            "row_count": self.row_ids.len(),
            "rated_count": self.ratings.lock().unwrap().len(),
            "project": {
                "id": self.project_id,
                "name": "Chat quality",
                "evaluation_type": "rating",
                "evaluation_config": {"min": 1, "max": 5},
                "instructions": "Rate the answer.",
                "use_multi_questions": false,
                "questions": []
            }
        })
    }

    fn row(&self, index: usize) -> Value {
        let id = self.row_ids[index];
        let mine = self.ratings.lock().unwrap().get(&id).cloned();
        json!({
            "id": id,
            "row_index": index,
            "content": {"prompt": format!("Question {index}")},
            "ratings": mine.iter().collect::<Vec<_>>(),
            "my_rating": mine
        })
    }
}

fn authenticated(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|cookies| cookies.split(';').any(|pair| pair.trim() == format!("session_id={TOKEN}")))
}

fn not_authenticated() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response()
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response();
    }
    (
        [(header::SET_COOKIE, format!("session_id={TOKEN}; Path=/; HttpOnly"))],
        Json(json!({"message": "Login successful", "user": backend.user()})),
    )
        .into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !authenticated(&headers) {
        return not_authenticated();
    }
    Json(backend.user()).into_response()
}

async fn flaky_get(State(backend): State<Arc<Backend>>) -> Response {
    if backend.flaky_gets.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!({"ok": true})).into_response()
}

async fn failing_post(State(backend): State<Arc<Backend>>) -> Response {
    backend.failing_posts.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "Database unavailable"}))).into_response()
}

async fn session_detail(
    State(backend): State<Arc<Backend>>,
    UrlPath(session_id): UrlPath<Uuid>,
    headers: HeaderMap,
) -> Response {
    if !authenticated(&headers) {
        return not_authenticated();
    }
    if session_id != backend.session_id {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Session not found"}))).into_response();
    }
    Json(backend.session()).into_response()
}

async fn session_rows(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authenticated(&headers) {
        return not_authenticated();
    }
    backend.rows_queries.lock().unwrap().push(params.clone());

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);
    let filter = params.get("filter").map(String::as_str).unwrap_or("all");

    let ratings = backend.ratings.lock().unwrap().clone();
    let matching: Vec<usize> = (0..backend.row_ids.len())
        .filter(|&i| {
            let rated = ratings.contains_key(&backend.row_ids[i]);
            match filter {
                "rated" => rated,
                "unrated" => !rated,
                _ => true,
            }
        })
        .collect();

    let total = matching.len();
    let items: Vec<Value> = matching
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|&i| backend.row(i))
        .collect();

    Json(json!({
        "items": items,
        "total": total,
        "page": page,
        "per_page": per_page,
        "total_pages": total.div_ceil(per_page),
        "rated_count": ratings.len()
    }))
    .into_response()
}

async fn submit_rating(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authenticated(&headers) {
        return not_authenticated();
    }
    let Some(row_id) = body["data_row_id"].as_str().and_then(|id| id.parse::<Uuid>().ok()) else {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": "data_row_id missing"}))).into_response();
    };

    let rating = json!({
        "id": Uuid::new_v4(),
        "rating_value": body["rating_value"],
        "response": body["response"],
        "comment": body["comment"],
        "rated_at": "2024-05-02T09:30:00",
        "rater_id": backend.user_id,
        "rater_username": "alice"
    });
    backend.ratings.lock().unwrap().insert(row_id, rating.clone());
    Json(rating).into_response()
}

async fn export(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !authenticated(&headers) {
        return not_authenticated();
    }
    match params.get("format").map(String::as_str) {
        Some("csv") => ([(header::CONTENT_TYPE, "text/csv")], "prompt,rating\nQuestion 0,4\n").into_response(),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"detail": "Unsupported format"}))).into_response(),
    }
}

fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/flaky", get(flaky_get).post(failing_post))
        .route("/api/sessions/{session_id}", get(session_detail))
        .route("/api/sessions/{session_id}/rows", get(session_rows))
        .route("/api/sessions/{session_id}/export", get(export))
        .route("/api/ratings", post(submit_rating))
        .with_state(backend)
}

async fn spawn(backend: Arc<Backend>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(backend)).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn config(api_url: &str, session_file: &Path) -> Config {
    Config {
        api_url: api_url.to_string(),
        timeout_secs: 5,
        per_page: 10,
        session_file: session_file.to_path_buf(),
    }
}

fn credentials(password: &str) -> LoginCredentials {
    LoginCredentials {
        username: "alice".to_string(),
        password: password.to_string(),
    }
}

async fn logged_in_store(api_url: &str, session_file: &Path) -> Store {
    let store = Store::new(ApiClient::new(&config(api_url, session_file)).unwrap());
    store.login(&credentials(PASSWORD)).await.unwrap();
    store
}

#[tokio::test]
async fn test_login_persists_session_for_next_invocation() {
    let backend = Backend::new(1);
    let api_url = spawn(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("hitl").join("session");

    let store = logged_in_store(&api_url, &session_file).await;
    assert!(store.client().has_session());
    let saved = std::fs::read_to_string(&session_file).unwrap();
    assert_eq!(saved, format!("session_id={TOKEN}"));

    let fresh = Store::new(ApiClient::new(&config(&api_url, &session_file)).unwrap());
    let user = fresh.current_user().await.unwrap();
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_wrong_password_reports_backend_detail() {
    let backend = Backend::new(1);
    let api_url = spawn(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session");

    let store = Store::new(ApiClient::new(&config(&api_url, &session_file)).unwrap());
    let err = store.login(&credentials("wrong")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.message(), "Incorrect username or password");
    assert!(!session_file.exists());
}

#[tokio::test]
async fn test_unauthorized_clears_stored_session() {
    let backend = Backend::new(1);
    let api_url = spawn(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session");
    std::fs::write(&session_file, "session_id=expired").unwrap();

    let client = ApiClient::new(&config(&api_url, &session_file)).unwrap();
    assert!(client.has_session());

    let err = client.get_json::<Value>("/auth/me").await.unwrap_err();
    assert!(err.requires_login());
    assert!(!session_file.exists());
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_queries_retry_once_but_mutations_do_not() {
    let backend = Backend::new(1);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(&config(&api_url, &dir.path().join("session"))).unwrap();

    let body: Value = client.get_json("/flaky").await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(backend.flaky_gets.load(Ordering::SeqCst), 2);

    let err = client.post_empty("/flaky", Some(&json!({}))).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.message(), "Database unavailable");
    assert_eq!(backend.failing_posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rows_send_paging_and_filter() {
    let backend = Backend::new(3);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let page = store.rows(backend.session_id, 2, 2, RowFilter::Unrated).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].row_index, 2);

    let queries = backend.rows_queries.lock().unwrap().clone();
    let last = queries.last().unwrap();
    assert_eq!(last["page"], "2");
    assert_eq!(last["per_page"], "2");
    assert_eq!(last["filter"], "unrated");
}

#[tokio::test]
async fn test_missing_session_is_not_found() {
    let backend = Backend::new(1);
    let api_url = spawn(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let err = store.session(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(err.message(), "Session not found");
}

#[tokio::test]
async fn test_desk_rates_every_row_until_complete() {
    let backend = Backend::new(2);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 10).await.unwrap();
    assert_eq!(desk.position(), (1, 2));
    assert_eq!(desk.instructions(), Some("Rate the answer."));

    desk.set_response(None, EvaluationResponse::Rating(RatingResponse { value: 4 }))
        .unwrap();
    desk.set_comment("clear and correct");
    assert_eq!(desk.save(true).await.unwrap(), SaveOutcome::Saved);
    assert!(!desk.is_dirty());
    assert_eq!(desk.position(), (2, 2));
    assert_eq!(desk.rated_count(), 1);

    desk.set_response(None, EvaluationResponse::Rating(RatingResponse { value: 2 }))
        .unwrap();
    assert_eq!(desk.save(true).await.unwrap(), SaveOutcome::Completed);

    let ratings = backend.ratings.lock().unwrap().clone();
    let first = &ratings[&backend.row_ids[0]];
    assert_eq!(first["rating_value"], 4);
    assert_eq!(first["response"], json!({"value": 4}));
    assert_eq!(first["comment"], "clear and correct");
    assert_eq!(ratings[&backend.row_ids[1]]["rating_value"], 2);
}

#[tokio::test]
async fn test_desk_keeps_unsaved_draft_on_navigation() {
    let backend = Backend::new(2);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 10).await.unwrap();
    desk.set_response(None, EvaluationResponse::Rating(RatingResponse { value: 3 }))
        .unwrap();

    assert!(desk.next().await.is_err());
    assert_eq!(desk.position(), (1, 2));
    assert!(desk.is_dirty());

    desk.skip(true).await.unwrap();
    assert_eq!(desk.position(), (2, 2));
    assert!(!desk.is_dirty());
    assert!(backend.ratings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_names_file_after_session() {
    let backend = Backend::new(1);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let export = store.export_session(backend.session_id, ExportFormat::Csv).await.unwrap();
    assert_eq!(export.file_name, "Batch 1.csv");
    assert_eq!(export.bytes, b"prompt,rating\nQuestion 0,4\n".to_vec());
}

fn rating(value: i64) -> EvaluationResponse {
    EvaluationResponse::Rating(RatingResponse { value })
}

fn current_index(desk: &RatingDesk) -> i64 {
    desk.current_row().map(|row| row.row_index).unwrap()
}

#[tokio::test]
async fn test_unrated_save_and_next_stays_in_place() {
    let backend = Backend::new(4);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 2).await.unwrap();
    desk.set_filter(RowFilter::Unrated).await.unwrap();
    assert_eq!(current_index(&desk), 0);

    desk.set_response(None, rating(5)).unwrap();
    assert_eq!(desk.save(true).await.unwrap(), SaveOutcome::Saved);

    // The saved row dropped out of the list, so the same slot holds the next one.
    assert_eq!(desk.cursor().page, 1);
    assert_eq!(desk.cursor().index, 0);
    assert_eq!(current_index(&desk), 1);
    assert_eq!(desk.position(), (1, 3));
}

#[tokio::test]
async fn test_rating_last_unrated_page_falls_back_a_page() {
    let backend = Backend::new(3);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 2).await.unwrap();
    desk.set_filter(RowFilter::Unrated).await.unwrap();
    assert_eq!(desk.next().await.unwrap(), Step::Moved);
    assert_eq!(desk.next().await.unwrap(), Step::LoadPage(2));
    assert_eq!(current_index(&desk), 2);

    desk.set_response(None, rating(3)).unwrap();
    assert_eq!(desk.save(true).await.unwrap(), SaveOutcome::Saved);

    assert_eq!(desk.cursor().page, 1);
    assert_eq!(desk.cursor().index, 1);
    assert_eq!(current_index(&desk), 1);
    assert_eq!(desk.rows().total_pages, 1);
}

#[tokio::test]
async fn test_previous_crosses_back_to_last_row_of_page() {
    let backend = Backend::new(3);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 2).await.unwrap();
    desk.next().await.unwrap();
    assert_eq!(desk.next().await.unwrap(), Step::LoadPage(2));
    assert_eq!(desk.position(), (3, 3));
    assert!(desk.at_end());

    assert_eq!(desk.previous().await.unwrap(), Step::LoadPage(1));
    assert_eq!(desk.cursor().page, 1);
    assert_eq!(desk.cursor().index, 1);
    assert_eq!(current_index(&desk), 1);

    desk.previous().await.unwrap();
    assert!(desk.at_start());
    assert_eq!(desk.previous().await.unwrap(), Step::AtStart);
}

#[tokio::test]
async fn test_filter_change_resets_and_waits_for_clean_draft() {
    let backend = Backend::new(3);
    let api_url = spawn(Arc::clone(&backend)).await;
    let dir = tempfile::tempdir().unwrap();
    let store = logged_in_store(&api_url, &dir.path().join("session")).await;

    let mut desk = RatingDesk::open(store, backend.session_id, 2).await.unwrap();
    desk.next().await.unwrap();
    desk.next().await.unwrap();
    assert_eq!(desk.cursor().page, 2);

    desk.set_response(None, rating(2)).unwrap();
    let err = desk.set_filter(RowFilter::Unrated).await.unwrap_err();
    assert!(matches!(err, DeskError::UnsavedChanges));
    assert_eq!(desk.filter(), RowFilter::All);
    assert_eq!(desk.cursor().page, 2);

    desk.save(false).await.unwrap();
    desk.set_filter(RowFilter::Rated).await.unwrap();
    assert_eq!(desk.filter(), RowFilter::Rated);
    assert_eq!(desk.cursor().page, 1);
    assert_eq!(desk.cursor().index, 0);
    assert_eq!(current_index(&desk), 2);
    assert_eq!(desk.position(), (1, 1));

    let last = backend.rows_queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last["filter"], "rated");
    assert_eq!(last["page"], "1");
}
