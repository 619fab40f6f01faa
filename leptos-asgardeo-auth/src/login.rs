use crate::csrf::CsrfState;
use crate::pkce::CodeChallenge;
use itertools::Itertools;
use std::borrow::Cow;
use url::Url;

/// Login URL for the gateway strategies: a plain navigation to the gateway's login route,
/// which terminates the OIDC flow on the server side.
pub(crate) fn gateway_login_url(login_endpoint: Url) -> Url {
    login_endpoint
}

/// Login URL for the embedded flow: a full authorization request against the IdP, carrying
/// the PKCE challenge and the CSRF state.
pub(crate) fn authorize_url(
    authorization_endpoint: Url,
    client_id: &str,
    post_login_redirect_url: &str,
    scope: &[String],
    code_challenge: &CodeChallenge,
    csrf_state: &CsrfState,
) -> Url {
    let scope = match scope.len() {
        0 => Cow::Borrowed("openid"),
        _ => Cow::Owned(
            scope
                .iter()
                .map(|it| it.trim())
                .filter(|it| !it.is_empty() && *it != "openid")
                .chain(["openid"])
                .join(" "),
        ),
    };

    let mut url: Url = authorization_endpoint;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", post_login_redirect_url)
        .append_pair("scope", &scope)
        .append_pair("state", csrf_state.as_str())
        .append_pair("code_challenge", code_challenge.code_challenge())
        .append_pair(
            "code_challenge_method",
            code_challenge.code_challenge_method().as_str(),
        );
    url
}
