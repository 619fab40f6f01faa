use crate::response::SuccessTokenResponse;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Tokens obtained through the embedded code flow (or provisioned externally), together with
/// the expiry bookkeeping needed to judge their usability without contacting the IdP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,

    /// Present when the `openid` scope was granted. Sent as `id_token_hint` on logout.
    pub id_token: Option<String>,

    /// Point in time at which the access token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

impl TokenData {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }
}

impl From<SuccessTokenResponse> for TokenData {
    fn from(value: SuccessTokenResponse) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            access_token: value.access_token,
            id_token: value.id_token,
            expires_at: now + time::Duration::seconds(value.expires_in),
            received_at: now,
        }
    }
}
