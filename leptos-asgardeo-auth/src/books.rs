use crate::gateway::{ApiError, ApiGateway};
use crate::session::{SessionEpoch, SharedEpoch};
use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

const BOOKS_PATH: &str = "api/v1/books";

const MAX_TITLE_LEN: usize = 200;
const MAX_AUTHOR_LEN: usize = 100;

/// A book as stored by the backend. The `id` is backend-assigned and opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// User input for creating a book, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// Validation failures mirror the backend's rules so that obviously invalid input never
/// produces a request. The display strings are user-facing.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum BookValidationError {
    #[snafu(display("Title is required."))]
    TitleMissing,

    #[snafu(display("Title must be at most {MAX_TITLE_LEN} characters."))]
    TitleTooLong,

    #[snafu(display("Author is required."))]
    AuthorMissing,

    #[snafu(display("Author must be at most {MAX_AUTHOR_LEN} characters."))]
    AuthorTooLong,
}

impl BookDraft {
    /// Trim all fields and check them against the backend's constraints.
    pub fn validated(mut self) -> Result<Self, BookValidationError> {
        self.title = self.title.trim().to_owned();
        self.author = self.author.trim().to_owned();
        self.isbn = self
            .isbn
            .map(|it| it.trim().to_owned())
            .filter(|it| !it.is_empty());

        if self.title.is_empty() {
            return Err(BookValidationError::TitleMissing);
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(BookValidationError::TitleTooLong);
        }
        if self.author.is_empty() {
            return Err(BookValidationError::AuthorMissing);
        }
        if self.author.chars().count() > MAX_AUTHOR_LEN {
            return Err(BookValidationError::AuthorTooLong);
        }
        Ok(self)
    }
}

/// Thin, typed wrapper around the book endpoints of the backend. Errors are forwarded
/// unchanged; interpretation is left to the [`BookStore`] (or whatever else calls this).
#[derive(Debug, Clone)]
pub struct BookApi {
    gateway: ApiGateway,
}

impl BookApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Book>, ApiError> {
        self.gateway.get(BOOKS_PATH).await
    }

    pub async fn create(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        self.gateway.post(BOOKS_PATH, draft).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.gateway.delete(&format!("{BOOKS_PATH}/{id}")).await
    }
}

/// Ephemeral, session-scoped cache of the book list plus the signals the UI renders from.
///
/// `books` distinguishes "nothing loaded / cache cleared" (`None`) from "the server reports
/// no books" (`Some(vec![])`). The two must never be collapsed: the first renders a spinner
/// or nothing, the second renders an explicit empty state.
///
/// Every applier is epoch-guarded. A result computed under a previous session epoch (the user
/// signed out, or a 401 tore the session down while the request was in flight) is discarded
/// instead of being written into the new session's UI.
#[derive(Debug, Clone)]
pub struct BookStore {
    epoch: SharedEpoch,
    books: ArcRwSignal<Option<Vec<Book>>>,
    busy: ArcRwSignal<bool>,
    last_error: ArcRwSignal<Option<String>>,
    notice: ArcRwSignal<Option<String>>,
}

impl BookStore {
    pub fn new(epoch: SharedEpoch) -> Self {
        Self {
            epoch,
            books: ArcRwSignal::new(None),
            busy: ArcRwSignal::new(false),
            last_error: ArcRwSignal::new(None),
            notice: ArcRwSignal::new(None),
        }
    }

    pub fn books(&self) -> ArcReadSignal<Option<Vec<Book>>> {
        self.books.read_only()
    }

    pub fn busy(&self) -> ArcReadSignal<bool> {
        self.busy.read_only()
    }

    /// Last user-facing error message (dismissible banner).
    pub fn last_error(&self) -> ArcReadSignal<Option<String>> {
        self.last_error.read_only()
    }

    /// Last user-facing success message (dismissible banner).
    pub fn notice(&self) -> ArcReadSignal<Option<String>> {
        self.notice.read_only()
    }

    pub fn dismiss_error(&self) {
        self.last_error.set(None);
    }

    pub fn dismiss_notice(&self) {
        self.notice.set(None);
    }

    /// Fetch the current list from the backend, replacing the cache.
    /// Overlapping refreshes resolve last-response-wins.
    pub async fn refresh(&self, api: &BookApi) {
        let began = self.epoch.current();
        self.busy.set(true);
        let result = api.list().await;
        self.finish_list(began, result);
        self.busy.set(false);
    }

    /// Validate and create a book, then refetch the list so the UI reflects the backend's
    /// state (including the assigned id). A failed creation leaves the cached list untouched.
    pub async fn create(&self, api: &BookApi, draft: BookDraft) {
        let draft = match draft.validated() {
            Ok(draft) => draft,
            Err(err) => {
                self.last_error.set(Some(err.to_string()));
                return;
            }
        };

        let began = self.epoch.current();
        self.busy.set(true);
        let result = api.create(&draft).await;
        match &result {
            Ok(book) if self.epoch.is_current(began) => {
                self.notice.set(Some(format!("Added '{}'.", book.title)));
            }
            _ => {}
        }
        if self.finish_mutation(began, result.map(|_| ())) {
            let result = api.list().await;
            self.finish_list(began, result);
        }
        self.busy.set(false);
    }

    /// Delete a book, then refetch. A failed deletion (e.g. 404 because someone else already
    /// removed it) leaves the cached list untouched and records a banner.
    pub async fn delete(&self, api: &BookApi, id: &str) {
        let began = self.epoch.current();
        self.busy.set(true);
        let result = api.delete(id).await;
        if self.epoch.is_current(began) && result.is_ok() {
            self.notice.set(Some("Book deleted.".to_owned()));
        }
        if self.finish_mutation(began, result) {
            let result = api.list().await;
            self.finish_list(began, result);
        }
        self.busy.set(false);
    }

    /// Apply the result of a list fetch. A failed fetch clears the cache: a stale list is
    /// worse than an honest "could not load".
    pub(crate) fn finish_list(&self, began: SessionEpoch, result: Result<Vec<Book>, ApiError>) {
        if !self.epoch.is_current(began) {
            tracing::debug!("Discarding book list response from a previous session");
            return;
        }
        match result {
            Ok(books) => {
                self.books.set(Some(books));
                self.last_error.set(None);
            }
            Err(ApiError::AuthRequired) => {
                // The session manager owns the messaging for this case.
                self.books.set(None);
            }
            Err(err) => {
                self.books.set(None);
                self.last_error.set(Some(err.user_message()));
            }
        }
    }

    /// Apply the result of a mutation. Returns whether a refetch should follow.
    pub(crate) fn finish_mutation(
        &self,
        began: SessionEpoch,
        result: Result<(), ApiError>,
    ) -> bool {
        if !self.epoch.is_current(began) {
            tracing::debug!("Discarding book mutation response from a previous session");
            return false;
        }
        match result {
            Ok(()) => {
                self.last_error.set(None);
                true
            }
            Err(ApiError::AuthRequired) => {
                self.books.set(None);
                false
            }
            Err(err) => {
                self.last_error.set(Some(err.user_message()));
                false
            }
        }
    }
}
