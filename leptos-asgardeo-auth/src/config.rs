use crate::strategy::SessionStrategy;
use leptos_use::storage::StorageType;
use url::Url;

/// Joins path segments onto a base URL without disturbing any path the base already carries.
pub(crate) fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.path_segments_mut()
        .expect("no cannot-be-a-base url")
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    url
}

/// Authentication parameters required for initializing the session manager.
pub struct UseAsgardeoAuthOptions {
    pub strategy: SessionStrategy,

    /// Base URL of the backend resource API, e.g. `https://app.example.dev/choreo-apis/books/v1/`.
    /// Book endpoints (`api/v1/books`, ...) are resolved against this.
    pub api_base_url: Url,

    /// Base URL of the auth-aware gateway serving `/auth/login`, `/auth/logout` and
    /// `/auth/userinfo`. For Choreo managed auth this is simply the web app's own origin.
    pub auth_gateway_url: Url,

    /// IdP connection details. Required for [`SessionStrategy::EmbeddedOidc`], ignored by the
    /// other strategies.
    pub idp: Option<IdpOptions>,

    /// Url to which you want to be redirected after a successful login.
    pub post_login_redirect_url: Url,

    /// Url to which you want to be redirected after a successful logout.
    pub post_logout_redirect_url: Url,

    /// OAuth scopes to request in the embedded flow. `openid` is always included.
    pub scope: Vec<String>,

    /// Where token data is persisted between page loads. Defaults to local storage.
    pub token_storage: StorageType,

    pub advanced: AdvancedOptions,
}

// Manual impl: `StorageType` implements neither `Debug` nor `Clone`, so the derive fails.
impl std::fmt::Debug for UseAsgardeoAuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseAsgardeoAuthOptions")
            .field("strategy", &self.strategy)
            .field("api_base_url", &self.api_base_url)
            .field("auth_gateway_url", &self.auth_gateway_url)
            .field("idp", &self.idp)
            .field("post_login_redirect_url", &self.post_login_redirect_url)
            .field("post_logout_redirect_url", &self.post_logout_redirect_url)
            .field("scope", &self.scope)
            .field(
                "token_storage",
                match &self.token_storage {
                    StorageType::Local => &"Local",
                    StorageType::Session => &"Session",
                    StorageType::Custom(_) => &"Custom(..)",
                },
            )
            .field("advanced", &self.advanced)
            .finish()
    }
}

impl UseAsgardeoAuthOptions {
    pub(crate) fn login_endpoint(&self) -> Url {
        join_path(&self.auth_gateway_url, &self.advanced.login_path)
    }

    pub(crate) fn logout_endpoint(&self) -> Url {
        join_path(&self.auth_gateway_url, &self.advanced.logout_path)
    }

    pub(crate) fn userinfo_endpoint(&self) -> Url {
        match (self.strategy, &self.idp) {
            // The embedded flow asks the IdP directly. Everything else goes through the gateway.
            (SessionStrategy::EmbeddedOidc, Some(idp)) => idp.userinfo_endpoint(),
            _ => join_path(&self.auth_gateway_url, &self.advanced.userinfo_path),
        }
    }
}

/// Connection details of the Asgardeo organization used by the embedded OIDC flow.
#[derive(Debug)]
pub struct IdpOptions {
    /// Base URL of your Asgardeo organization,
    /// e.g. `https://api.asgardeo.io/t/myorg/`.
    pub server_url: Url,

    /// The client id of the application registered in the Asgardeo console.
    pub client_id: String,
}

impl IdpOptions {
    pub(crate) fn authorization_endpoint(&self) -> Url {
        join_path(&self.server_url, "oauth2/authorize")
    }

    pub(crate) fn token_endpoint(&self) -> Url {
        join_path(&self.server_url, "oauth2/token")
    }

    pub(crate) fn end_session_endpoint(&self) -> Url {
        join_path(&self.server_url, "oidc/logout")
    }

    pub(crate) fn userinfo_endpoint(&self) -> Url {
        join_path(&self.server_url, "oauth2/userinfo")
    }
}

#[derive(Debug)]
pub struct AdvancedOptions {
    /// Path of the gateway's login route, resolved against `auth_gateway_url`.
    /// Defaults to `auth/login`.
    pub login_path: String,

    /// Path of the gateway's logout route, resolved against `auth_gateway_url`.
    /// Defaults to `auth/logout`.
    pub logout_path: String,

    /// Path of the gateway's userinfo route, resolved against `auth_gateway_url`.
    /// Defaults to `auth/userinfo`.
    pub userinfo_path: String,

    /// Name of the one-shot cookie in which the gateway leaves the encoded user info after a
    /// login redirect. Defaults to `userinfo`.
    pub userinfo_cookie: String,

    /// Name of the cookie carrying the opaque session hint the gateway expects back on logout.
    /// Defaults to `session_hint`.
    pub session_hint_cookie: String,

    /// Name of the query parameter under which the session hint is sent on logout.
    /// Defaults to `session_hint`.
    pub session_hint_param: String,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            login_path: "auth/login".to_owned(),
            logout_path: "auth/logout".to_owned(),
            userinfo_path: "auth/userinfo".to_owned(),
            userinfo_cookie: "userinfo".to_owned(),
            session_hint_cookie: "session_hint".to_owned(),
            session_hint_param: "session_hint".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assertr::prelude::*;
    use url::Url;

    use super::*;

    #[test]
    fn join_path_keeps_base_path() {
        let base = Url::parse("https://app.example.dev/choreo-apis/books/v1/").unwrap();
        let joined = join_path(&base, "api/v1/books");
        assert_that(joined.as_str())
            .is_equal_to("https://app.example.dev/choreo-apis/books/v1/api/v1/books");
    }

    #[test]
    fn join_path_ignores_empty_segments() {
        let base = Url::parse("https://app.example.dev").unwrap();
        let joined = join_path(&base, "/auth//login/");
        assert_that(joined.as_str()).is_equal_to("https://app.example.dev/auth/login");
    }

    #[test]
    fn idp_endpoints_derive_from_server_url() {
        let idp = IdpOptions {
            server_url: Url::parse("https://api.asgardeo.io/t/myorg/").unwrap(),
            client_id: "client-123".to_owned(),
        };
        assert_that(idp.authorization_endpoint().as_str())
            .is_equal_to("https://api.asgardeo.io/t/myorg/oauth2/authorize");
        assert_that(idp.token_endpoint().as_str())
            .is_equal_to("https://api.asgardeo.io/t/myorg/oauth2/token");
        assert_that(idp.end_session_endpoint().as_str())
            .is_equal_to("https://api.asgardeo.io/t/myorg/oidc/logout");
        assert_that(idp.userinfo_endpoint().as_str())
            .is_equal_to("https://api.asgardeo.io/t/myorg/oauth2/userinfo");
    }
}
