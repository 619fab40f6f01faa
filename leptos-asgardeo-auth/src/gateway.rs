use crate::session::SharedEpoch;
use crate::AccessToken;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::{ResultExt, Snafu};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use url::Url;

/// Supplies the current access token for bearer-based strategies.
/// Returning `None` means "no usable token right now" and sends the request unauthenticated,
/// letting the backend be the authority.
pub type TokenSource = Arc<dyn Fn() -> Option<AccessToken> + Send + Sync>;

/// Invoked at most once per session epoch when a request observed a 401.
/// The session manager installs a reporter that drops local identity and redirects to sign-in.
pub type UnauthorizedReporter = Arc<dyn Fn() + Send + Sync>;

/// How credentials are attached to outgoing requests.
#[derive(Clone)]
pub enum Credentials {
    /// The browser carries the session cookies. Nothing is attached explicitly.
    CookieSession,

    /// An `Authorization: Bearer` header is attached, sourced on every request.
    Bearer(TokenSource),
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::CookieSession => f.write_str("CookieSession"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Everything an [`ApiGateway`] needs besides the HTTP client itself.
#[derive(Clone)]
pub struct GatewayContext {
    /// Base URL of the backend resource API. Request paths are appended to this.
    pub api_base: Url,

    pub credentials: Credentials,

    /// Session epoch shared with the session manager.
    pub epoch: SharedEpoch,

    pub on_unauthorized: UnauthorizedReporter,
}

impl Debug for GatewayContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayContext")
            .field("api_base", &self.api_base)
            .field("credentials", &self.credentials)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Errors produced by the [`ApiGateway`].
///
/// The taxonomy the presentation layer has to care about is deliberately small:
/// - [`ApiError::AuthRequired`] — the session is gone; the session manager has already been
///   signalled (exactly once, no matter how many concurrent requests failed).
/// - [`ApiError::RequestFailed`] — the backend rejected the operation; carries the status and,
///   when present, the server-supplied message.
/// - [`ApiError::Network`] — the request never produced a response.
///
/// Use [`ApiError::user_message`] when rendering; raw error objects must never reach the UI.
#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(display("ApiError: Authentication required"))]
    AuthRequired,

    #[snafu(display("ApiError: Request failed with status {status}"))]
    RequestFailed {
        status: StatusCode,
        message: Option<String>,
    },

    #[snafu(display("ApiError: Could not reach the backend"))]
    Network { source: reqwest::Error },

    #[snafu(display("ApiError: Could not decode response payload"))]
    Decode { source: reqwest::Error },

    #[snafu(display("ApiError: Invalid endpoint path"))]
    InvalidEndpoint,
}

impl ApiError {
    /// Whether a retry of the SAME request could plausibly succeed.
    /// Only transport failures and server-side errors qualify. `AuthRequired` never does: the
    /// gateway always defers to the session manager to re-establish identity.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::RequestFailed { status, .. } => status.is_server_error(),
            ApiError::AuthRequired | ApiError::Decode { .. } | ApiError::InvalidEndpoint => false,
        }
    }

    /// A plain string safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthRequired => "Your session has expired. Please sign in again.".to_owned(),
            ApiError::RequestFailed {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::RequestFailed { status, .. } => {
                format!("The request failed with status {status}. Please try again.")
            }
            ApiError::Network { .. } => {
                "Could not reach the server. Please check your connection and try again.".to_owned()
            }
            ApiError::Decode { .. } | ApiError::InvalidEndpoint => {
                "Something went wrong while talking to the server. Please try again.".to_owned()
            }
        }
    }
}

/// Extracts a human-readable message from an error response body.
/// The backend uses both `{"message": "..."}` and `{"error": "..."}` shapes.
pub(crate) fn extract_server_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|it| it.as_str())
        .map(ToOwned::to_owned)
}

/// HTTP client for the backend resource API with credential injection and authentication-aware
/// error handling.
///
/// Every request:
/// 1. has the configured credentials attached (bearer header, or nothing for cookie sessions),
/// 2. is resolved against the configured API base URL,
/// 3. is translated into the [`ApiError`] taxonomy.
///
/// A 401 response signals the session manager through the shared epoch, which guarantees the
/// session is torn down exactly once even under concurrent failures. The gateway NEVER retries a
/// request on its own; bounded retries for idempotent reads are opt-in via
/// [`RetryPolicy`](crate::retry::RetryPolicy).
///
/// Create an instance using [`Authenticated::gateway()`](crate::Authenticated::gateway) or
/// [`Authenticated::gateway_from()`](crate::Authenticated::gateway_from).
#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: reqwest::Client,
    ctx: GatewayContext,
}

impl ApiGateway {
    pub fn new(client: reqwest::Client, ctx: GatewayContext) -> Self {
        Self { client, ctx }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.ctx.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| InvalidEndpointSnafu.build())?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Perform a request, returning the raw response.
    ///
    /// Only 401 and transport failures are translated at this level; all other statuses pass
    /// through so that callers interested in the raw response can inspect them. Prefer
    /// [`json`](Self::json) and [`unit`](Self::unit) which also map non-2xx statuses.
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        with: impl Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        let began = self.ctx.epoch.current();

        let mut builder = self.client.request(method, url);
        if let Credentials::Bearer(source) = &self.ctx.credentials {
            if let Some(token) = source() {
                builder = builder.bearer_auth(token);
            }
        }
        builder = with(builder);

        let response = builder.send().await.context(NetworkSnafu)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // The backend is the authority on authentication. Whatever we locally believed, the
            // session is gone. Signal the session manager, but only if no other request already
            // did so for this epoch.
            if self.ctx.epoch.invalidate_if_current(began) {
                tracing::warn!("Request was rejected with 401. Signalling the session manager.");
                (self.ctx.on_unauthorized)();
            }
            return AuthRequiredSnafu.fail();
        }

        Ok(response)
    }

    /// Perform a request and parse the JSON response body.
    pub async fn json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        with: impl Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path, with).await?;
        let response = Self::ensure_success(response).await?;
        response.json::<T>().await.context(DecodeSnafu)
    }

    /// Perform a request, discarding any response body. Use this for endpoints that answer with
    /// an empty body or a body the caller has no use for (e.g. `DELETE` returning 200 or 204).
    pub async fn unit(
        &self,
        method: reqwest::Method,
        path: &str,
        with: impl Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<(), ApiError> {
        let response = self.request(method, path, with).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Perform a GET request and parse the JSON response body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.json(reqwest::Method::GET, path, |builder| builder).await
    }

    /// Perform a POST request with a JSON body and parse the JSON response body.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.json(reqwest::Method::POST, path, |builder| builder.json(body))
            .await
    }

    /// Perform a DELETE request, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.unit(reqwest::Method::DELETE, path, |builder| builder)
            .await
    }

    /// Probe the backend's health endpoint. An idempotent read, and a natural candidate for a
    /// [`RetryPolicy`](crate::retry::RetryPolicy) wrapper when used as a readiness gate.
    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.get("health").await
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .as_deref()
            .and_then(extract_server_message);
        RequestFailedSnafu { status, message }.fail()
    }
}

#[cfg(test)]
mod tests {
    use assertr::prelude::*;

    use super::*;

    #[test]
    fn extract_server_message_from_message_field() {
        let extracted = extract_server_message(r#"{"message": "Book deleted successfully"}"#);
        assert_that(extracted).is_equal_to(Some("Book deleted successfully".to_owned()));
    }

    #[test]
    fn extract_server_message_from_error_field() {
        let extracted = extract_server_message(r#"{"error": "Book not found"}"#);
        assert_that(extracted).is_equal_to(Some("Book not found".to_owned()));
    }

    #[test]
    fn extract_server_message_prefers_message_over_error() {
        let extracted = extract_server_message(r#"{"message": "a", "error": "b"}"#);
        assert_that(extracted).is_equal_to(Some("a".to_owned()));
    }

    #[test]
    fn extract_server_message_from_non_json_body() {
        assert_that(extract_server_message("<html>Bad Gateway</html>")).is_equal_to(None);
    }

    #[test]
    fn extract_server_message_from_non_string_field() {
        assert_that(extract_server_message(r#"{"message": 42}"#)).is_equal_to(None);
    }

    #[test]
    fn transient_classification() {
        assert_that(ApiError::AuthRequired.is_transient()).is_false();
        assert_that(
            ApiError::RequestFailed {
                status: StatusCode::NOT_FOUND,
                message: None,
            }
            .is_transient(),
        )
        .is_false();
        assert_that(
            ApiError::RequestFailed {
                status: StatusCode::BAD_GATEWAY,
                message: None,
            }
            .is_transient(),
        )
        .is_true();
    }

    #[test]
    fn user_message_prefers_server_supplied_text() {
        let err = ApiError::RequestFailed {
            status: StatusCode::BAD_REQUEST,
            message: Some("Title is required".to_owned()),
        };
        assert_that(err.user_message()).is_equal_to("Title is required".to_owned());
    }

    #[test]
    fn user_message_falls_back_to_status() {
        let err = ApiError::RequestFailed {
            status: StatusCode::BAD_REQUEST,
            message: None,
        };
        assert_that(err.user_message().contains("400")).is_true();
    }
}
