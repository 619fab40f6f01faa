/// Cryptographically secure token sent as the `state` parameter of an authorization request
/// and verified when the callback returns, to avoid CSRF attacks on the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CsrfState {
    state: String,
}

impl CsrfState {
    /// Generate a new CSRF state, using 32 bytes of cryptographically secure random data,
    /// base64 url encoded as a 43 character string.
    pub fn new() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        let state = URL_SAFE_NO_PAD.encode(bytes);

        Self { state }
    }

    pub fn as_str(&self) -> &str {
        &self.state
    }

    /// Constant-shape comparison against the `state` the callback carried.
    pub fn matches(&self, returned: Option<&str>) -> bool {
        returned == Some(self.state.as_str())
    }
}

impl Default for CsrfState {
    fn default() -> Self {
        Self::new()
    }
}
