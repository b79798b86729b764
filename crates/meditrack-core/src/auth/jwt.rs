//! HS256 API tokens.
//!
//! Issued after a successful Google sign-in and presented as a bearer token
//! on every authenticated endpoint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Claims carried by an API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Signs and verifies API tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InvalidToken(format!("bad signing key: {e}")))
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AuthError::InvalidToken(format!("cannot encode claims: {e}")))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_seg), Some(payload_seg), Some(signature_seg), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("malformed token".into()));
        };

        let header: Header = decode_json(header_seg)?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_seg)
            .map_err(|_| AuthError::InvalidToken("malformed signature".into()))?;
        let mut mac = self.mac()?;
        mac.update(header_seg.as_bytes());
        mac.update(b".");
        mac.update(payload_seg.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".into()))?;

        decode_json(payload_seg)
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken("malformed segment".into()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidToken(e.to_string()))
}
