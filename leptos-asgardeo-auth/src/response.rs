use leptos_router::params::{ParamsError, ParamsMap};
use serde::{Deserialize, Serialize};

/// The response to a token request, either success or error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum TokenResponse {
    Success(SuccessTokenResponse),
    Error(ErrorResponse),
}

/// A successful token response from the IdP's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct SuccessTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
}

/// OAuth 2.0 error response, as returned by the token endpoint or appended to the redirect
/// query by the authorization endpoint.
///
/// See [RFC 6749 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// The error code (e.g. `invalid_grant` or `access_denied`).
    pub error: String,

    /// OPTIONAL. Human-readable text providing additional information, used to assist the
    /// client developer in understanding the error that occurred.
    pub error_description: Option<String>,
}

/// Query parameters appended by the IdP when redirecting back after an authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoginCallback {
    pub code: String,

    /// Must match the CSRF state we sent along with the authorization request.
    pub state: Option<String>,
}

impl leptos_router::params::Params for LoginCallback {
    fn from_map(map: &ParamsMap) -> Result<Self, ParamsError> {
        let Some(code) = map.get("code") else {
            // Expected whenever the current page load is not an authorization callback.
            return Err(ParamsError::MissingParam(
                "Missing query parameter 'code'.".to_string(),
            ));
        };

        let state = map.get("state");

        Ok(LoginCallback { code, state })
    }
}

impl leptos_router::params::Params for ErrorResponse {
    fn from_map(map: &ParamsMap) -> Result<Self, ParamsError> {
        let Some(error) = map.get("error") else {
            return Err(ParamsError::MissingParam(
                "Missing query parameter 'error'.".to_string(),
            ));
        };

        let error_description = map.get("error_description");

        Ok(ErrorResponse {
            error,
            error_description,
        })
    }
}
