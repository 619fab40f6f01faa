use serde::{Deserialize, Serialize};

/// Identity of the signed-in user as reported by the userinfo endpoint or the one-shot
/// userinfo cookie.
///
/// Every field is optional. Which claims are present depends on the granted scopes and on
/// the IdP's attribute configuration. Claims we do not model explicitly are preserved in
/// `additional_claims`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, alias = "preferred_username")]
    pub username: Option<String>,

    #[serde(flatten)]
    pub additional_claims: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Best human-readable name available, falling back to a generic label so the UI never
    /// renders an empty greeting.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or("User")
    }
}
