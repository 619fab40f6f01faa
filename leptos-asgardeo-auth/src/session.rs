use crate::config::UseAsgardeoAuthOptions;
use crate::gateway::{ApiGateway, GatewayContext};
use crate::profile::UserProfile;
use crate::AccessToken;
use leptos::prelude::*;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

/// Session epoch identifier. Internally represented using a numeric value.
///
/// This type is not orderable by design. We only ever need to compare two potentially different
/// epochs for equality, which still works after an overflow.
#[derive(Debug, PartialEq, Eq, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    const ZERO: SessionEpoch = SessionEpoch(0);

    #[must_use]
    pub fn next(self) -> Self {
        SessionEpoch(self.0.wrapping_add(1))
    }
}

impl Default for SessionEpoch {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Shared, atomically advanced session epoch.
///
/// One instance is shared between the session manager, every [`ApiGateway`] created from it and
/// any resource cache built on top (see `BookStore`). Advancing the epoch creates a boundary that
/// invalidates async result handlers which originated from a previous authentication session:
/// such handlers compare the epoch they captured at start time against the current one and
/// discard their result on mismatch.
///
/// ## When the epoch ADVANCES:
/// - On sign-out.
/// - On the first 401 observation of a session (see [`SharedEpoch::invalidate_if_current`]).
///
/// ## When it does NOT advance:
/// - On ordinary request failures. A failed read does not end the session.
#[derive(Debug, Clone, Default)]
pub struct SharedEpoch(Arc<AtomicU64>);

impl SharedEpoch {
    pub fn current(&self) -> SessionEpoch {
        SessionEpoch(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, seen: SessionEpoch) -> bool {
        self.current() == seen
    }

    /// Advance the epoch unconditionally, invalidating all in-flight handlers.
    pub fn advance(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Advance the epoch only if `seen` is still the current one.
    ///
    /// Returns `true` for exactly ONE caller per epoch. This is what makes the
    /// 401-to-unauthenticated transition idempotent: any number of concurrent requests may
    /// observe a 401 for the same session, but only the first reporter wins the compare-exchange
    /// and gets to tear the session down.
    pub fn invalidate_if_current(&self, seen: SessionEpoch) -> bool {
        self.0
            .compare_exchange(
                seen.0,
                seen.0.wrapping_add(1),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// The current state of the session.
///
/// - `Loading` while the single startup session check is in flight. Protected content must not
///   be rendered in this state.
/// - `Authenticated` when the session check (or a later login) succeeded.
/// - `NotAuthenticated` in every other case: no session cookie, no stored token, an expired
///   token, a failed userinfo probe, ...
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(Authenticated),
    NotAuthenticated(NotAuthenticated),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// State only accessible when the user is authenticated.
///
/// Call [`Authenticated::gateway`] to receive an [`ApiGateway`] that attaches the session's
/// credentials to every request and reports authentication failures back to the session manager.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated {
    /// Profile of the signed-in user, as reported by the userinfo endpoint (possibly overridden
    /// by the one-shot userinfo cookie left behind by the login redirect).
    pub profile: Signal<UserProfile>,

    /// Access token for bearer-based strategies. `None` under the cookie-session strategy, where
    /// the browser carries the credentials.
    pub access_token: Signal<Option<AccessToken>>,

    pub(crate) gateway_ctx: StoredValue<GatewayContext>,
}

impl PartialEq for Authenticated {
    fn eq(&self, other: &Self) -> bool {
        // Only excluding gateway_ctx.
        self.profile == other.profile && self.access_token == other.access_token
    }
}

impl Eq for Authenticated {}

impl Authenticated {
    /// Create an [`ApiGateway`] using a fresh `reqwest::Client`.
    pub fn gateway(&self) -> ApiGateway {
        ApiGateway::new(reqwest::Client::new(), self.gateway_ctx.get_value())
    }

    /// Create an [`ApiGateway`] from an existing `reqwest::Client`.
    pub fn gateway_from(&self, client: reqwest::Client) -> ApiGateway {
        ApiGateway::new(client, self.gateway_ctx.get_value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAuthenticated {
    /// Last user-facing error message, if any. Raw error objects never cross this boundary.
    pub last_error: Signal<Option<String>>,
}

/// The session handle this library tracks for you. Gives access to `login_url` and `logout_url`
/// as well as the current session `state`.
///
/// Provided as context by [`init_asgardeo_auth`](crate::init_asgardeo_auth). Use
/// [`use_asgardeo_auth`](crate::use_asgardeo_auth) to get access to it in any component rendered
/// below the component that performed the init call.
///
/// When all you need is information about the signed-in user, prefer
/// `expect_context::<Authenticated>()` (or [`use_authenticated`](crate::use_authenticated)) in
/// any component rendered under `ShowWhenAuthenticated`.
#[derive(Debug, Clone, Copy)]
pub struct AsgardeoAuth {
    pub(crate) options: StoredValue<UseAsgardeoAuthOptions>,

    /// URL for initiating the sign-in flow, directing the user to the auth gateway's login
    /// route or the IdP's authorization endpoint. May be `None` until it could be computed.
    pub login_url: Signal<Option<Url>>,

    /// URL for initiating the sign-out flow. May be `None` until it could be computed.
    pub logout_url: Signal<Option<Url>>,

    pub state: Signal<SessionState>,

    /// Derived signal stating `true` when `state` is of the `Authenticated` variant.
    pub is_authenticated: Signal<bool>,

    pub(crate) epoch: StoredValue<SharedEpoch>,
    pub(crate) sign_in_trigger: Callback<()>,
    pub(crate) sign_out_trigger: Callback<()>,
}

impl AsgardeoAuth {
    pub fn state(&self) -> Signal<SessionState> {
        self.state
    }

    /// The options this session manager was initialized with.
    pub fn options(&self) -> StoredValue<UseAsgardeoAuthOptions> {
        self.options
    }

    /// The shared session epoch. Resource caches hold onto this to discard async results that
    /// belong to a previous session.
    pub fn epoch(&self) -> SharedEpoch {
        self.epoch.get_value()
    }

    /// Start the sign-in flow. This performs a full-page navigation and is terminal for the
    /// current page.
    pub fn sign_in(&self) {
        self.sign_in_trigger.run(());
    }

    /// Terminate the session. Local identity (profile, stored tokens) is cleared FIRST, then a
    /// full-page navigation to the logout URL is performed. If a session hint is present locally
    /// it is appended to the logout URL so that the upstream IdP session is terminated as well.
    pub fn sign_out(&self) {
        self.sign_out_trigger.run(());
    }

    /// Returns a reactive function that pretty prints the current session state.
    /// Useful for debugging purposes.
    pub fn state_pretty_printer(&self) -> impl Fn() -> String {
        let state = self.state;
        move || format!("{:#?}", state.read().deref())
    }
}

#[cfg(test)]
mod tests {
    use assertr::prelude::*;

    use super::*;

    #[test]
    fn epoch_default_is_zero() {
        assert_that(SessionEpoch::default()).is_equal_to(SessionEpoch::ZERO);
        assert_that(SessionEpoch::ZERO).is_equal_to(SessionEpoch(0));
    }

    #[test]
    fn epoch_next() {
        assert_that(SessionEpoch(0).next()).is_equal_to(SessionEpoch(1));
    }

    #[test]
    fn epoch_next_wraps_around() {
        assert_that(SessionEpoch(u64::MAX).next()).is_equal_to(SessionEpoch(0));
    }

    #[test]
    fn shared_epoch_advance() {
        let epoch = SharedEpoch::default();
        let seen = epoch.current();
        epoch.advance();
        assert_that(epoch.is_current(seen)).is_false();
        assert_that(epoch.current()).is_equal_to(seen.next());
    }

    #[test]
    fn shared_epoch_invalidation_succeeds_only_once() {
        let epoch = SharedEpoch::default();
        let seen = epoch.current();
        assert_that(epoch.invalidate_if_current(seen)).is_true();
        // A concurrent observer of the same epoch must lose the race.
        assert_that(epoch.invalidate_if_current(seen)).is_false();
        // An observer of the NEW epoch is a new observation and may invalidate again.
        assert_that(epoch.invalidate_if_current(epoch.current())).is_true();
    }
}
