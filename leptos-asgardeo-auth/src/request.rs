use crate::profile::UserProfile;
use crate::response::{ErrorResponse, TokenResponse};
use crate::token::TokenData;
use http::StatusCode;
use reqwest::IntoUrl;
use snafu::{ResultExt, Snafu};
use std::collections::HashMap;

#[derive(Debug, Snafu)]
pub enum RequestError {
    #[snafu(display("RequestError: Could not send request"))]
    Send { source: reqwest::Error },

    #[snafu(display("RequestError: Could not decode payload"))]
    Decode { source: reqwest::Error },

    #[snafu(display("RequestError: Received unexpected status {status}"))]
    UnexpectedStatus { status: StatusCode },

    #[snafu(display("RequestError: Received an error response"))]
    ErrResponse { error_response: ErrorResponse },
}

/// Probe the userinfo endpoint to determine whether a session currently exists, and if so,
/// who the user is.
///
/// With cookie-based strategies the browser attaches the session cookies on its own; bearer
/// strategies pass the access token explicitly. Any non-2xx status means "no usable session"
/// to the caller (most backends answer 401, Choreo's gateway may answer 302 to the IdP, which
/// the fetch layer surfaces as an opaque failure).
pub(crate) async fn fetch_user_info(
    userinfo_endpoint: impl IntoUrl,
    bearer: Option<impl AsRef<str>>,
) -> Result<UserProfile, RequestError> {
    let mut builder = reqwest::Client::new().get(userinfo_endpoint);
    if let Some(token) = &bearer {
        builder = builder.bearer_auth(token.as_ref());
    }
    let response = builder.send().await.context(SendSnafu {})?;

    let status = response.status();
    if !status.is_success() {
        return UnexpectedStatusSnafu { status }.fail();
    }

    response.json::<UserProfile>().await.context(DecodeSnafu {})
}

/// Exchange an authorization code for tokens at the IdP's token endpoint.
pub(crate) async fn exchange_code_for_token(
    token_endpoint: impl IntoUrl,
    client_id: impl AsRef<str>,
    redirect_uri: impl AsRef<str>,
    code: impl AsRef<str>,
    code_verifier: impl AsRef<str>,
) -> Result<TokenData, RequestError> {
    async fn inner(
        params: HashMap<&str, &str>,
        token_endpoint: impl IntoUrl,
    ) -> Result<TokenData, RequestError> {
        match reqwest::Client::new()
            .post(token_endpoint)
            .form(&params)
            .send()
            .await
            .context(SendSnafu {})?
            .json::<TokenResponse>()
            .await
            .context(DecodeSnafu {})?
        {
            TokenResponse::Success(success) => Ok(success.into()),
            TokenResponse::Error(error) => Err(ErrResponseSnafu {
                error_response: error,
            }
            .build()),
        }
    }
    let mut params: HashMap<&str, &str> = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("client_id", client_id.as_ref());
    params.insert("redirect_uri", redirect_uri.as_ref());
    params.insert("code", code.as_ref());
    params.insert("code_verifier", code_verifier.as_ref());
    inner(params, token_endpoint).await
}
