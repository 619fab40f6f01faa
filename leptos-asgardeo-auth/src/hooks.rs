use crate::config::UseAsgardeoAuthOptions;
use crate::csrf::CsrfState;
use crate::error::AsgardeoAuthError;
use crate::gateway::{Credentials, GatewayContext, TokenSource, UnauthorizedReporter};
use crate::one_shot::{with_cookie_override, OneShotUserInfo};
use crate::pkce::PkceVerifier;
use crate::profile::UserProfile;
use crate::request::{self, RequestError};
use crate::response::{ErrorResponse, LoginCallback};
use crate::session::{
    AsgardeoAuth, Authenticated, NotAuthenticated, SessionEpoch, SessionState, SharedEpoch,
};
use crate::strategy::SessionStrategy;
use crate::token::TokenData;
use crate::{login, logout, storage, AccessToken};
use codee::string::{FromToStringCodec, JsonSerdeCodec};
use http::StatusCode;
use leptos::callback::Callback;
use leptos::context::provide_context;
use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_query};
use leptos_router::NavigateOptions;
use leptos_use::storage::StorageType;
use leptos_use::use_cookie;
use std::ops::Deref;
use std::sync::Arc;
use url::Url;

const SESSION_EXPIRED_MSG: &str = "Your session has expired. Please sign in again.";

/// Initializes the session manager with the provided authentication parameters, returning the
/// [`AsgardeoAuth`] handle (also provided as Leptos context).
///
/// Must be called INSIDE a `leptos_router` `<Router>`, as callback parameters are read through
/// the router.
///
/// Exactly one session check runs on startup. The returned state is
/// [`SessionState::Loading`] until that check settles, and `Authenticated` or
/// `NotAuthenticated` afterwards, regardless of how the check went. The check itself never
/// surfaces an error: anything that prevents a positive answer degrades to
/// `NotAuthenticated`, with a user-facing message in `last_error` where that helps.
pub fn init_asgardeo_auth(options: UseAsgardeoAuthOptions) -> AsgardeoAuth {
    tracing::trace!("Initializing Asgardeo auth...");

    let strategy = options.strategy;
    let options = StoredValue::new(options);

    let epoch = SharedEpoch::default();

    let (profile, set_profile) = signal::<Option<UserProfile>>(None);
    let (check_settled, set_check_settled) = signal(false);
    let (last_error, set_last_error) = signal::<Option<String>>(None);

    // Token persistence for the bearer strategies. Under `CookieSession` this stays `None`
    // forever; the browser holds the credentials.
    // `StorageType` is not `Clone`, so rebuild it from the stored options by hand.
    let token_storage = match &options.read_value().token_storage {
        StorageType::Local => StorageType::Local,
        StorageType::Session => StorageType::Session,
        StorageType::Custom(storage) => StorageType::Custom(storage.clone()),
    };
    let (token, set_token, remove_token_from_storage) =
        storage::use_persistent::<Option<TokenData>, JsonSerdeCodec>(
            token_storage,
            "asgardeo_token",
        );
    let remove_token_from_storage = StoredValue::new(remove_token_from_storage);

    // PKCE verifier and CSRF state must survive the full-page redirect to the IdP,
    // so they live in session storage rather than in memory.
    let (pkce, set_pkce, _) = storage::use_persistent::<Option<PkceVerifier>, JsonSerdeCodec>(
        StorageType::Session,
        "asgardeo_pkce",
    );
    let (csrf, set_csrf, _) = storage::use_persistent::<Option<CsrfState>, JsonSerdeCodec>(
        StorageType::Session,
        "asgardeo_login_state",
    );
    if strategy.drives_code_flow() {
        if pkce.get_untracked().is_none() {
            set_pkce.set(Some(PkceVerifier::generate()));
        }
        if csrf.get_untracked().is_none() {
            set_csrf.set(Some(CsrfState::new()));
        }
    }

    let userinfo_cookie_name = options.read_value().advanced.userinfo_cookie.clone();
    let one_shot = OneShotUserInfo::new(&userinfo_cookie_name);

    let session_hint_cookie_name = options.read_value().advanced.session_hint_cookie.clone();
    let (session_hint, _) = use_cookie::<String, FromToStringCodec>(&session_hint_cookie_name);

    let access_token: Signal<Option<AccessToken>> = Signal::derive(move || {
        match strategy.attaches_bearer_token() {
            true => token
                .get()
                .filter(|it| !it.is_expired())
                .map(|it| it.access_token),
            false => None,
        }
    });

    let clear_local_identity = Callback::new(move |()| {
        tracing::trace!("Dropping local identity");
        set_profile.set(None);
        set_token.set(None);
        remove_token_from_storage.read_value()();
    });

    let login_url: Memo<Option<Url>> = Memo::new(move |_| match strategy {
        SessionStrategy::CookieSession | SessionStrategy::BearerToken => Some(
            login::gateway_login_url(options.read_value().login_endpoint()),
        ),
        SessionStrategy::EmbeddedOidc => {
            let verifier = pkce.get()?;
            let csrf_state = csrf.get()?;
            let opts = options.read_value();
            let idp = opts.idp.as_ref()?;
            Some(login::authorize_url(
                idp.authorization_endpoint(),
                &idp.client_id,
                opts.post_login_redirect_url.as_str(),
                &opts.scope,
                &verifier.to_code_challenge(),
                &csrf_state,
            ))
        }
    });

    let logout_url: Memo<Option<Url>> = Memo::new(move |_| match strategy {
        SessionStrategy::CookieSession | SessionStrategy::BearerToken => {
            let opts = options.read_value();
            let hint = session_hint.get();
            Some(logout::gateway_logout_url(
                opts.logout_endpoint(),
                &opts.advanced.session_hint_param,
                hint.as_deref(),
            ))
        }
        SessionStrategy::EmbeddedOidc => {
            let opts = options.read_value();
            let idp = opts.idp.as_ref()?;
            let id_token = token.get().and_then(|it| it.id_token);
            Some(logout::end_session_url(
                idp.end_session_endpoint(),
                id_token.as_deref(),
                &opts.post_logout_redirect_url,
            ))
        }
    });

    // What the gateway does when a request runs into a 401. The epoch was already advanced
    // (exactly once) by the gateway when this runs.
    let on_unauthorized: UnauthorizedReporter = Arc::new(move || {
        clear_local_identity.run(());
        set_last_error.set(Some(SESSION_EXPIRED_MSG.to_owned()));
        if let Some(url) = login_url.get_untracked() {
            redirect_to(&url);
        }
    });

    let token_source: TokenSource = Arc::new(move || access_token.get_untracked());
    let gateway_ctx = StoredValue::new(GatewayContext {
        api_base: options.read_value().api_base_url.clone(),
        credentials: match strategy.attaches_bearer_token() {
            true => Credentials::Bearer(token_source),
            false => Credentials::CookieSession,
        },
        epoch: epoch.clone(),
        on_unauthorized,
    });

    // The single startup session check. The `Effect` may rerun; the guard makes sure the
    // check itself does not.
    let check_started = StoredValue::new(false);
    {
        let epoch = epoch.clone();
        Effect::new(move |_| {
            if check_started.get_value() {
                return;
            }
            check_started.set_value(true);

            let userinfo_endpoint = options.read_value().userinfo_endpoint();
            let bearer = access_token.get_untracked();
            let began = epoch.current();
            let epoch = epoch.clone();
            leptos::task::spawn_local(async move {
                check_session(
                    userinfo_endpoint,
                    bearer,
                    epoch,
                    began,
                    one_shot,
                    set_profile,
                    set_last_error,
                    set_check_settled,
                )
                .await;
            });
        });
    }

    // Authorization-code callback handling for the embedded flow.
    // THIS EFFECT COMPLETES THE LOGIN once the IdP redirects back to us.
    if strategy.drives_code_flow() {
        let url_query = use_query::<LoginCallback>();
        let error_query = use_query::<ErrorResponse>();
        let last_handled_code = StoredValue::new(Option::<String>::None);
        let error_handled = StoredValue::new(false);
        let epoch = epoch.clone();
        Effect::new(move |_| {
            let callback = match url_query.get() {
                Ok(callback) => callback,
                Err(err) => {
                    // An IdP that could not complete the flow redirects back with `error`
                    // instead of `code`, e.g. `access_denied` when the user cancelled consent.
                    if let Ok(error_response) = error_query.get() {
                        if !error_handled.get_value() {
                            error_handled.set_value(true);
                            tracing::error!(?error_response, "The IdP reported a failed login");
                            set_last_error.set(Some(
                                "Sign-in was not completed. Please try again.".to_owned(),
                            ));
                            set_check_settled.set(true);
                            let navigate = use_navigate();
                            navigate(
                                options.read_value().post_login_redirect_url.as_str(),
                                NavigateOptions::default(),
                            );
                        }
                        return;
                    }
                    // Expected whenever the current page load is not an authorization
                    // callback. Only useful when debugging a broken login flow.
                    tracing::trace!("{}", AsgardeoAuthError::Params { err });
                    return;
                }
            };

            // The code must never be exchanged twice, and effects may rerun.
            if last_handled_code.get_value().as_deref() == Some(callback.code.as_str()) {
                return;
            }
            last_handled_code.set_value(Some(callback.code.clone()));

            let state_matches = csrf
                .get_untracked()
                .is_some_and(|expected| expected.matches(callback.state.as_deref()));
            // Fresh secrets for the next login attempt, whether this one completes or not.
            set_csrf.set(Some(CsrfState::new()));
            let verifier = pkce.get_untracked();
            set_pkce.set(Some(PkceVerifier::generate()));

            if !state_matches {
                tracing::error!("{}", AsgardeoAuthError::CallbackStateMismatch);
                set_last_error.set(Some(
                    "Sign-in could not be completed securely. Please try again.".to_owned(),
                ));
                set_check_settled.set(true);
                return;
            }
            let Some(verifier) = verifier else {
                tracing::error!("Received an authorization code without a stored PKCE verifier");
                set_check_settled.set(true);
                return;
            };

            let (token_endpoint, client_id) = {
                let opts = options.read_value();
                match opts.idp.as_ref() {
                    Some(idp) => (idp.token_endpoint(), idp.client_id.clone()),
                    None => {
                        tracing::error!("The embedded OIDC strategy requires `idp` options");
                        set_check_settled.set(true);
                        return;
                    }
                }
            };
            let redirect_uri = options.read_value().post_login_redirect_url.to_string();
            let userinfo_endpoint = options.read_value().userinfo_endpoint();
            let began = epoch.current();
            let epoch = epoch.clone();
            let code = callback.code.clone();
            leptos::task::spawn_local(async move {
                match request::exchange_code_for_token(
                    token_endpoint,
                    &client_id,
                    &redirect_uri,
                    &code,
                    verifier.code_verifier(),
                )
                .await
                {
                    Ok(token_data) => {
                        if !epoch.is_current(began) {
                            tracing::debug!("Discarding token exchange result from a previous session");
                            return;
                        }
                        let bearer = Some(token_data.access_token.clone());
                        set_token.set(Some(token_data));
                        check_session(
                            userinfo_endpoint,
                            bearer,
                            epoch,
                            began,
                            one_shot,
                            set_profile,
                            set_last_error,
                            set_check_settled,
                        )
                        .await;
                    }
                    Err(err) => {
                        tracing::error!(
                            "{}",
                            snafu::Report::from_error(AsgardeoAuthError::Request { source: err })
                        );
                        if epoch.is_current(began) {
                            set_last_error
                                .set(Some("Sign-in failed. Please try again.".to_owned()));
                            set_check_settled.set(true);
                        }
                    }
                }
            });

            // The callback parameters are consumed now. Leaving them in the url would make
            // this branch fire again on the next router update, and it leaks flow internals
            // into the address bar. A programmatic, client-side navigation drops them.
            let navigate = use_navigate();
            navigate(
                options.read_value().post_login_redirect_url.as_str(),
                NavigateOptions::default(),
            );
        });
    }

    let authenticated = Authenticated {
        profile: Signal::derive(move || profile.get().unwrap_or_default()),
        access_token,
        gateway_ctx,
    };
    let not_authenticated = NotAuthenticated {
        last_error: last_error.into(),
    };

    let state = Memo::new(move |_| {
        if !check_settled.get() {
            return SessionState::Loading;
        }
        let has_profile = profile.read().is_some();
        let credentials_usable = match strategy.attaches_bearer_token() {
            true => access_token.read().is_some(),
            false => true,
        };
        if has_profile && credentials_usable {
            SessionState::Authenticated(authenticated)
        } else {
            SessionState::NotAuthenticated(not_authenticated)
        }
    });

    let sign_in_trigger = Callback::new(move |()| match login_url.get_untracked() {
        Some(url) => redirect_to(&url),
        None => tracing::warn!("Cannot sign in: the login URL is not yet available"),
    });

    let sign_out_trigger = {
        let epoch = epoch.clone();
        Callback::new(move |()| {
            // Resolve the target FIRST. Clearing local state drops the id token and would
            // otherwise strip the hint the logout URL needs.
            let target = logout_url.get_untracked();
            epoch.advance();
            clear_local_identity.run(());
            set_last_error.set(None);
            match target {
                Some(url) => redirect_to(&url),
                None => {
                    tracing::warn!("The logout URL is not available. Cleared local state only.")
                }
            }
        })
    };

    let auth = AsgardeoAuth {
        options,
        login_url: login_url.into(),
        logout_url: logout_url.into(),
        state: state.into(),
        is_authenticated: Signal::derive(move || state.read().deref().is_authenticated()),
        epoch: StoredValue::new(epoch),
        sign_in_trigger,
        sign_out_trigger,
    };

    // We guarantee that the AsgardeoAuth state is provided as context.
    provide_context(auth);

    auth
}

/// Access the [`AsgardeoAuth`] handle provided by [`init_asgardeo_auth`] in a parent component.
///
/// Panics when no parent called [`init_asgardeo_auth`]. Use [`try_use_asgardeo_auth`] for a
/// non-panicking variant.
pub fn use_asgardeo_auth() -> AsgardeoAuth {
    try_use_asgardeo_auth()
        .expect("AsgardeoAuth context to be present. Did a parent component call init_asgardeo_auth()?")
}

pub fn try_use_asgardeo_auth() -> Option<AsgardeoAuth> {
    use_context::<AsgardeoAuth>()
}

/// Access the [`Authenticated`] context. Only callable in components rendered under a
/// `ShowWhenAuthenticated`.
pub fn use_authenticated() -> Authenticated {
    expect_context::<Authenticated>()
}

fn redirect_to(url: &Url) {
    tracing::trace!(%url, "Performing a full-page navigation");
    if let Err(err) = window().location().set_href(url.as_str()) {
        tracing::error!(?err, "Could not navigate to {url}");
    }
}

/// Probe for an active session and settle the auth state accordingly.
///
/// Used by both the startup check and the post-code-exchange profile fetch. The endpoint is
/// always probed; only a successful probe consumes the one-shot userinfo cookie, whose
/// payload then overrides the endpoint's answer (it describes exactly the login that just
/// happened).
#[allow(clippy::too_many_arguments)]
async fn check_session(
    userinfo_endpoint: Url,
    bearer: Option<String>,
    epoch: SharedEpoch,
    began: SessionEpoch,
    one_shot: OneShotUserInfo,
    set_profile: WriteSignal<Option<UserProfile>>,
    set_last_error: WriteSignal<Option<String>>,
    set_check_settled: WriteSignal<bool>,
) {
    let result = with_cookie_override(
        request::fetch_user_info(userinfo_endpoint, bearer).await,
        || one_shot.consume(),
    );

    if !epoch.is_current(began) {
        tracing::debug!("Discarding session check result from a previous session");
        return;
    }

    match result {
        Ok(profile) => {
            set_profile.set(Some(profile));
            set_last_error.set(None);
        }
        Err(RequestError::UnexpectedStatus { status }) if status == StatusCode::UNAUTHORIZED => {
            tracing::debug!("No active session");
            set_profile.set(None);
        }
        Err(err) => {
            tracing::warn!(
                "{}",
                snafu::Report::from_error(AsgardeoAuthError::Request { source: err })
            );
            set_profile.set(None);
            set_last_error.set(Some(
                "Could not determine your sign-in status. Please try signing in.".to_owned(),
            ));
        }
    }
    set_check_settled.set(true);
}
