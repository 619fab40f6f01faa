use url::Url;

/// Logout URL for the gateway strategies.
///
/// The session hint MUST be forwarded when one is locally present. Without it the gateway may
/// consider the logout incomplete and silently sign the user back in on the next page load.
/// When no hint is present no query parameter is appended at all.
pub(crate) fn gateway_logout_url(
    logout_endpoint: Url,
    session_hint_param: &str,
    session_hint: Option<&str>,
) -> Url {
    let mut url = logout_endpoint;
    if let Some(hint) = session_hint {
        url.query_pairs_mut().append_pair(session_hint_param, hint);
    }
    url
}

/// Logout URL for the embedded flow: the IdP's end-session endpoint with the id token as a
/// hint and the URL to return to afterwards.
pub(crate) fn end_session_url(
    end_session_endpoint: Url,
    id_token: Option<&str>,
    post_logout_redirect_url: &Url,
) -> Url {
    let mut url = end_session_endpoint;
    url.query_pairs_mut()
        .append_pair("post_logout_redirect_uri", post_logout_redirect_url.as_str());
    if let Some(id_token) = id_token {
        url.query_pairs_mut().append_pair("id_token_hint", id_token);
    }
    url
}
