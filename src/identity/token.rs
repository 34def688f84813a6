//! Structural bearer-token decoding.
//!
//! Splits `header.payload.signature` and decodes the payload claims.
//! The signature is never checked here: the identity provider verifies
//! tokens when they are presented to it. Decoded claims are only used for
//! expiry inspection and for reading the subject.

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Decoded payload of a bearer token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Subject (user id), if present and non-empty.
    pub fn sub(&self) -> Option<&str> {
        self.0
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Expiry in Unix seconds. Fractional values are truncated.
    pub fn exp(&self) -> Option<i64> {
        let exp = self.0.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    /// True only when an `exp` claim exists and is strictly before `now_secs`.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp().is_some_and(|exp| exp < now_secs)
    }

    /// True when an `exp` claim exists and falls less than `window` after `now_millis`.
    pub fn expires_within(&self, now_millis: i64, window: Duration) -> bool {
        self.exp().is_some_and(|exp| {
            exp.saturating_mul(1000).saturating_sub(now_millis) < window.as_millis() as i64
        })
    }
}

/// Decode the payload segment of a three-part bearer token.
pub fn decode_payload(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(segments.len()));
    }

    let bytes = decode_base64url(segments[1])?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(Claims(map)),
        Ok(_) => Err(TokenError::Decode("payload is not a JSON object".into())),
        Err(e) => Err(TokenError::Decode(e.to_string())),
    }
}

/// Base64url → standard alphabet, padded to a multiple of 4.
fn decode_base64url(segment: &str) -> Result<Vec<u8>, TokenError> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    STANDARD
        .decode(standard.as_bytes())
        .map_err(|e| TokenError::Decode(format!("invalid base64url payload: {e}")))
}

/// Build an unsigned token carrying `claims`. Used for fixtures and local tooling.
pub fn encode_unsigned(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(b"unsigned");
    format!("{header}.{payload}.{sig}")
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: expected 3 segments, found {0}")]
    Malformed(usize),

    #[error("failed to decode token payload: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_roundtrip_preserves_claims() {
        let claims = json!({
            "sub": "user_01HXYZ",
            "exp": 9999999999u64,
            "sid": "session_01",
            "org_id": "org_123",
            "permissions": ["documents:read", "documents:write"],
            "nested": {"a": [1, 2, {"b": null}]},
            "unicode": "caf\u{e9} \u{1F600}",
        });
        let token = encode_unsigned(&claims);
        let decoded = decode_payload(&token).unwrap();
        assert_eq!(decoded, Claims(claims.as_object().unwrap().clone()));
    }

    #[test]
    fn test_wrong_segment_counts_are_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d", "....", "a..b.c"] {
            match decode_payload(token) {
                Err(TokenError::Malformed(n)) => assert_ne!(n, 3, "token {token:?}"),
                other => panic!("expected Malformed for {token:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_base64_is_decode_error() {
        let err = decode_payload("header.!!!not-base64!!!.sig").unwrap_err();
        assert!(matches!(err, TokenError::Decode(_)));
    }

    #[test]
    fn test_non_json_payload_is_decode_error() {
        let payload = URL_SAFE_NO_PAD.encode(b"definitely not json");
        let err = decode_payload(&format!("h.{payload}.s")).unwrap_err();
        assert!(matches!(err, TokenError::Decode(_)));
    }

    #[test]
    fn test_non_object_payload_is_decode_error() {
        let payload = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let err = decode_payload(&format!("h.{payload}.s")).unwrap_err();
        assert!(matches!(err, TokenError::Decode(_)));
    }

    #[test]
    fn test_padded_and_url_safe_payloads_decode() {
        // "?>?" encodes to "Pz4/" in standard base64, "Pz4_" in base64url.
        let json_bytes = br#"{"k":"?>?"}"#;
        let payload = URL_SAFE_NO_PAD.encode(json_bytes);
        assert!(!payload.ends_with('='));
        let decoded = decode_payload(&format!("h.{payload}.s")).unwrap();
        assert_eq!(decoded.get("k").unwrap(), "?>?");

        let padded = STANDARD.encode(json_bytes);
        let decoded = decode_payload(&format!("h.{padded}.s")).unwrap();
        assert_eq!(decoded.get("k").unwrap(), "?>?");
    }

    #[test]
    fn test_sub_and_exp_accessors() {
        let token = encode_unsigned(&json!({"sub": "user123", "exp": 1700000000}));
        let claims = decode_payload(&token).unwrap();
        assert_eq!(claims.sub(), Some("user123"));
        assert_eq!(claims.exp(), Some(1700000000));

        let token = encode_unsigned(&json!({"sub": "", "exp": 1700000000.75}));
        let claims = decode_payload(&token).unwrap();
        assert_eq!(claims.sub(), None);
        assert_eq!(claims.exp(), Some(1700000000));
    }

    #[test]
    fn test_is_expired_at_is_strict() {
        let claims = decode_payload(&encode_unsigned(&json!({"exp": 1000}))).unwrap();
        assert!(claims.is_expired_at(1001));
        assert!(!claims.is_expired_at(1000));
        assert!(!claims.is_expired_at(999));

        let no_exp = decode_payload(&encode_unsigned(&json!({"sub": "u"}))).unwrap();
        assert!(!no_exp.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_expires_within_window() {
        let now_ms = 1_000_000_000_000i64;
        let window = Duration::from_secs(300);

        let soon = decode_payload(&encode_unsigned(&json!({"exp": now_ms / 1000 + 60}))).unwrap();
        assert!(soon.expires_within(now_ms, window));

        let later = decode_payload(&encode_unsigned(&json!({"exp": now_ms / 1000 + 3600}))).unwrap();
        assert!(!later.expires_within(now_ms, window));

        let past = decode_payload(&encode_unsigned(&json!({"exp": now_ms / 1000 - 60}))).unwrap();
        assert!(past.expires_within(now_ms, window));

        let none = decode_payload(&encode_unsigned(&json!({}))).unwrap();
        assert!(!none.expires_within(now_ms, window));
    }
}
