use crate::profile::UserProfile;
use crate::request::RequestError;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use codee::string::FromToStringCodec;
use leptos::prelude::*;
use leptos_use::use_cookie;

/// Decodes the base64-encoded JSON the gateway leaves in the one-shot userinfo cookie.
/// Gateways differ in the base64 alphabet they use, so both common ones are accepted.
pub(crate) fn decode_userinfo_cookie(raw: &str) -> Option<UserProfile> {
    let bytes = STANDARD
        .decode(raw)
        .ok()
        .or_else(|| URL_SAFE_NO_PAD.decode(raw).ok())?;
    match serde_json::from_slice::<UserProfile>(&bytes) {
        Ok(profile) => Some(profile),
        Err(err) => {
            tracing::warn!(?err, "Could not parse the userinfo cookie payload");
            None
        }
    }
}

/// Merge the one-shot cookie into the outcome of a userinfo probe.
///
/// The cookie describes the login that just happened and wins over the endpoint's answer, but
/// it is only trusted (and consumed) once the backend confirmed an active session. A failed
/// probe leaves the cookie alone: a stale cookie must never resurrect a dead session.
pub(crate) fn with_cookie_override(
    probed: Result<UserProfile, RequestError>,
    consume: impl FnOnce() -> Option<UserProfile>,
) -> Result<UserProfile, RequestError> {
    match probed {
        Ok(profile) => Ok(consume().unwrap_or(profile)),
        Err(err) => Err(err),
    }
}

/// The user info the auth gateway hands over after a login redirect, left behind in a cookie
/// meant to be read EXACTLY ONCE and deleted immediately after.
///
/// Consuming it twice would be a bug (the second read would see nothing and wrongly clear the
/// profile), so this handle enforces the at-most-once contract itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OneShotUserInfo {
    cookie: Signal<Option<String>>,
    set_cookie: WriteSignal<Option<String>>,
    consumed: StoredValue<bool>,
}

impl OneShotUserInfo {
    pub(crate) fn new(cookie_name: &str) -> Self {
        let (cookie, set_cookie) = use_cookie::<String, FromToStringCodec>(cookie_name);
        Self {
            cookie,
            set_cookie,
            consumed: StoredValue::new(false),
        }
    }

    /// Take the cookie's payload, deleting the cookie. Returns `None` if no cookie is present
    /// or it was already consumed. A present but undecodable cookie is still consumed (and
    /// deleted), so a corrupt value cannot be retried forever.
    pub(crate) fn consume(&self) -> Option<UserProfile> {
        if self.consumed.get_value() {
            return None;
        }
        let raw = self.cookie.get_untracked()?;
        self.consumed.set_value(true);
        self.set_cookie.set(None);
        decode_userinfo_cookie(&raw)
    }
}
