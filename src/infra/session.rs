use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Cookie names for the session pair.
pub const SESSION_COOKIE: &str = "discord_user";
pub const SESSION_SIG_COOKIE: &str = "discord_user_sig";

const SESSION_VERSION: u8 = 1;

/// The one canonical session payload shape. Versioned explicitly so a
/// future schema change invalidates old cookies instead of being
/// duck-typed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub v: u8,
    pub discord_id: String,
    /// Unix seconds. Expired payloads are rejected even with a valid
    /// signature.
    pub exp: i64,
}

/// Encodes/verifies the HMAC-signed session cookie pair. Only the OAuth
/// callback ever encodes; everything else verifies read-only.
#[derive(Clone)]
pub struct SessionCodec {
    key: Vec<u8>,
}

impl SessionCodec {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: secret.expose_secret().as_bytes().to_vec(),
        }
    }

    /// Returns (cookie value, signature) for a fresh session.
    pub fn encode(&self, discord_id: &str, ttl: time::Duration) -> (String, String) {
        let payload = SessionPayload {
            v: SESSION_VERSION,
            discord_id: discord_id.to_string(),
            exp: chrono::Utc::now().timestamp() + ttl.whole_seconds(),
        };
        // Serializing a struct of plain fields cannot fail.
        let json = serde_json::to_string(&payload).expect("session payload serializes");
        let value = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let sig = self.sign(&value);
        (value, sig)
    }

    /// Verifies a cookie pair. None for any of: bad signature, malformed
    /// payload, unknown version, expired. Callers clear the cookies on
    /// None so a broken session never lingers.
    pub fn decode(&self, value: &str, sig: &str) -> Option<SessionPayload> {
        if !constant_time_compare(&self.sign(value), sig) {
            return None;
        }
        let raw = URL_SAFE_NO_PAD.decode(value.as_bytes()).ok()?;
        let payload: SessionPayload = serde_json::from_slice(&raw).ok()?;
        if payload.v != SESSION_VERSION {
            return None;
        }
        if payload.exp <= chrono::Utc::now().timestamp() {
            return None;
        }
        Some(payload)
    }

    fn sign(&self, value: &str) -> String {
        let mut mac =
            <Hmac<Sha256> as Mac>::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
