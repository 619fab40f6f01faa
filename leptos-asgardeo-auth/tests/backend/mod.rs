use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use url::Url;

pub const VALID_TOKEN: &str = "test-token-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBook {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateBook {
    title: String,
    author: String,
    isbn: Option<String>,
}

#[derive(Clone, Default)]
struct AppState {
    books: Arc<Mutex<Vec<StoredBook>>>,
    flaky_failures_left: Arc<AtomicU32>,
    list_delay: Arc<Mutex<Duration>>,
}

/// In-memory stand-in for the real backend: bearer-protected book CRUD plus a `flaky`
/// endpoint that fails with 502 a configurable number of times before recovering.
pub struct MockBackend {
    pub url: Url,
    state: AppState,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = AppState::default();

        let router = Router::new()
            .route("/api/v1/books", get(list_books).post(create_book))
            .route("/api/v1/books/{id}", delete(delete_book))
            .route("/flaky", get(flaky))
            .route("/health", get(health))
            .with_state(state.clone())
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            state,
            handle,
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.state
            .books
            .lock()
            .unwrap()
            .iter()
            .map(|it| it.title.clone())
            .collect()
    }

    pub fn seed(&self, title: &str, author: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.state.books.lock().unwrap().push(StoredBook {
            id: id.clone(),
            title: title.to_owned(),
            author: author.to_owned(),
            isbn: None,
        });
        id
    }

    pub fn set_flaky_failures(&self, failures: u32) {
        self.state
            .flaky_failures_left
            .store(failures, Ordering::SeqCst);
    }

    /// Delay every list response, keeping requests in flight long enough for a test to act
    /// in between.
    pub fn set_list_delay(&self, delay: Duration) {
        *self.state.list_delay.lock().unwrap() = delay;
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|it| it.to_str().ok())
        == Some(&format!("Bearer {VALID_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}

async fn list_books(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let delay = *state.list_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let books = state.books.lock().unwrap().clone();
    Json(books).into_response()
}

async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBook>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if payload.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Title is required"})),
        )
            .into_response();
    }
    if payload.author.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Author is required"})),
        )
            .into_response();
    }
    let book = StoredBook {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        author: payload.author,
        isbn: payload.isbn,
    };
    state.books.lock().unwrap().push(book.clone());
    (StatusCode::CREATED, Json(book)).into_response()
}

async fn delete_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut books = state.books.lock().unwrap();
    let before = books.len();
    books.retain(|it| it.id != id);
    if books.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Book not found"})),
        )
            .into_response();
    }
    Json(json!({"message": "Book deleted successfully"})).into_response()
}

async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

async fn flaky(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let failures_left = &state.flaky_failures_left;
    if failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |it| it.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
    }
    Json(json!({"ok": true})).into_response()
}
