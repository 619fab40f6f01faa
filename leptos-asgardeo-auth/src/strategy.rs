/// How the application establishes and proves a session.
///
/// One session manager, three ways of holding credentials. The strategy decides where the
/// login/logout URLs point, whether requests carry an `Authorization: Bearer` header and
/// whether the library itself drives an OAuth 2.0 authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStrategy {
    /// An auth-aware gateway (e.g. Choreo managed authentication) terminates the OIDC flow and
    /// hands the browser opaque session cookies. The SPA never sees a token. Sign-in and
    /// sign-out are full-page navigations to the gateway's `/auth/login` and `/auth/logout`
    /// routes.
    CookieSession,

    /// The SPA drives the authorization-code flow with PKCE directly against the IdP, exchanges
    /// the callback code for tokens and attaches them as bearer credentials. Requires
    /// [`IdpOptions`](crate::config::IdpOptions).
    EmbeddedOidc,

    /// A token provisioned by some external mechanism already sits in storage and is attached
    /// as a bearer credential. The library only validates it against the userinfo endpoint.
    BearerToken,
}

impl SessionStrategy {
    /// Whether requests to the resource API carry an `Authorization: Bearer` header.
    pub fn attaches_bearer_token(self) -> bool {
        match self {
            SessionStrategy::CookieSession => false,
            SessionStrategy::EmbeddedOidc | SessionStrategy::BearerToken => true,
        }
    }

    /// Whether the library itself handles the authorization-code callback.
    pub fn drives_code_flow(self) -> bool {
        matches!(self, SessionStrategy::EmbeddedOidc)
    }
}
