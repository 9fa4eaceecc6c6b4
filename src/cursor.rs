//! Opaque pagination cursor: signed encoding of the last-seen primary key.
//!
//! Tokens are `base64url(payload).base64url(hmac)` where the payload is the
//! JSON-encoded `{userId, todoId}` continuation position. The HMAC prevents
//! clients from forging or editing positions; the embedded user id lets
//! decode reject a cursor minted for a different caller.
//!
//! No expiry is enforced: a cursor anchors a sort position, not a
//! time-limited credential.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Result, TodoError};

type HmacSha256 = Hmac<Sha256>;

/// Continuation position: the primary key of the last item already served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastKey {
    pub user_id: String,
    pub todo_id: String,
}

/// Encodes and validates pagination tokens.
///
/// The signing secret is injected at construction; it comes from
/// configuration, never from source.
#[derive(Clone)]
pub struct CursorCodec {
    secret: Vec<u8>,
}

impl CursorCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts any key length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key")
    }

    /// Encode a continuation position into an opaque token.
    pub fn encode(&self, key: &LastKey) -> Result<String> {
        let payload = serde_json::to_vec(key)
            .map_err(|e| TodoError::Internal(format!("cursor payload encoding: {}", e)))?;
        let mut mac = self.mac();
        mac.update(&payload);
        let sig = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(sig)
        ))
    }

    /// Decode and validate a token for the authenticated caller.
    ///
    /// Fails with a validation error when the token is malformed, the
    /// signature does not verify, or the embedded user differs from
    /// `expected_user` (cross-user pagination leakage).
    pub fn decode(&self, token: &str, expected_user: &str) -> Result<LastKey> {
        let invalid = || TodoError::Validation("invalid pagination token".to_string());

        let (payload_b64, sig_b64) = token.split_once('.').ok_or_else(invalid)?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|_| invalid())?;
        let sig = URL_SAFE_NO_PAD.decode(sig_b64).map_err(|_| invalid())?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&sig).map_err(|_| invalid())?;

        let key: LastKey = serde_json::from_slice(&payload).map_err(|_| invalid())?;
        if key.user_id != expected_user {
            return Err(TodoError::Validation(
                "pagination token does not belong to the caller".to_string(),
            ));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn codec() -> CursorCodec {
        CursorCodec::new(b"test-cursor-secret-at-least-32-b".to_vec())
    }

    fn key(user: &str) -> LastKey {
        LastKey {
            user_id: user.to_string(),
            todo_id: "20240101000000aaaa".to_string(),
        }
    }

    #[test]
    fn test_roundtrip() {
        let c = codec();
        let token = c.encode(&key("alice")).unwrap();
        assert_eq!(c.decode(&token, "alice").unwrap(), key("alice"));
    }

    #[test]
    fn test_token_is_opaque_base64url() {
        let token = codec().encode(&key("alice")).unwrap();
        assert!(!token.contains("alice"));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c)));
    }

    #[test]
    fn test_cross_user_reuse_is_rejected() {
        let c = codec();
        let token = c.encode(&key("alice")).unwrap();
        let err = c.decode(&token, "bob").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let c = codec();
        let token = c.encode(&key("alice")).unwrap();
        let (payload, sig) = token.split_once('.').unwrap();
        let forged = LastKey {
            user_id: "bob".into(),
            todo_id: "20240101000000aaaa".into(),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        assert_ne!(payload, forged_payload);
        let err = c
            .decode(&format!("{}.{}", forged_payload, sig), "bob")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let c = codec();
        for bad in ["", "not-a-token", "a.b", "####.####"] {
            let err = c.decode(bad, "alice").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_different_secret_rejects_token() {
        let token = codec().encode(&key("alice")).unwrap();
        let other = CursorCodec::new(b"another-secret-entirely-32-bytes".to_vec());
        assert!(other.decode(&token, "alice").is_err());
    }
}
