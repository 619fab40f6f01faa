use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// PKCE code verifier, see [RFC 7636](https://datatracker.ietf.org/doc/html/rfc7636).
///
/// Generated before redirecting to the authorization endpoint, persisted in session storage
/// across the redirect and presented at the code exchange. 32 random octets, base64url
/// encoded, give a 43 character verifier (the RFC's minimum length).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceVerifier {
    code_verifier: String,
}

impl PkceVerifier {
    pub(crate) fn generate() -> Self {
        let bytes: [u8; 32] = rand::rng().random();
        Self {
            code_verifier: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub fn code_verifier(&self) -> &str {
        self.code_verifier.as_str()
    }

    /// The S256 challenge sent with the authorization request:
    /// `base64url(sha256(code_verifier))`.
    pub(crate) fn to_code_challenge(&self) -> CodeChallenge {
        let digest = Sha256::digest(self.code_verifier.as_bytes());
        CodeChallenge {
            code_challenge: URL_SAFE_NO_PAD.encode(digest),
            code_challenge_method: CodeChallengeMethod::S256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    S256,
}

impl CodeChallengeMethod {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge {
    code_challenge: String,
    code_challenge_method: CodeChallengeMethod,
}

impl CodeChallenge {
    pub fn code_challenge(&self) -> &str {
        self.code_challenge.as_str()
    }

    pub fn code_challenge_method(&self) -> CodeChallengeMethod {
        self.code_challenge_method
    }
}
