//! Webhook signature verification.
//!
//! Both inbound webhooks carry an HMAC-SHA256 signature computed by the
//! sender over the raw request body; no state change happens before the
//! signature checks out. Two wire formats are in play:
//!
//! - Identity events (svix scheme): secret `whsec_<base64 key>`, signed
//!   content `{msg_id}.{timestamp}.{body}`, signature header holds
//!   space-separated `v1,<base64 sig>` entries.
//! - Billing events (stripe scheme): signed content `{t}.{body}`,
//!   signature header `t=<unix ts>,v1=<hex sig>[,v1=..]`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed signature header")]
    MalformedHeader,

    #[error("Malformed webhook secret")]
    MalformedSecret,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Verifies an identity-provider (svix-style) webhook.
pub fn verify_identity_signature(
    secret: &str,
    msg_id: &str,
    timestamp: &str,
    signature_header: &str,
    body: &[u8],
) -> Result<(), SignatureError> {
    let key = secret
        .strip_prefix("whsec_")
        .ok_or(SignatureError::MalformedSecret)?;
    let key = BASE64
        .decode(key)
        .map_err(|_| SignatureError::MalformedSecret)?;

    let mut signed = format!("{msg_id}.{timestamp}.").into_bytes();
    signed.extend_from_slice(body);

    // Header may carry several versioned signatures; any valid v1 passes.
    let mut saw_candidate = false;
    for entry in signature_header.split_whitespace() {
        let Some(sig) = entry.strip_prefix("v1,") else {
            continue;
        };
        saw_candidate = true;
        let Ok(sig) = BASE64.decode(sig) else {
            continue;
        };
        if mac_verify(&key, &signed, &sig) {
            return Ok(());
        }
    }

    if saw_candidate {
        Err(SignatureError::Mismatch)
    } else {
        Err(SignatureError::MalformedHeader)
    }
}

/// Verifies a billing-processor (stripe-style) webhook. Returns the
/// timestamp the sender signed, for callers that want to log it.
pub fn verify_billing_signature(
    secret: &str,
    signature_header: &str,
    body: &[u8],
) -> Result<i64, SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => candidates.push(v),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    let parsed: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);

    for candidate in candidates {
        let Ok(sig) = hex::decode(candidate) else {
            continue;
        };
        if mac_verify(secret.as_bytes(), &signed, &sig) {
            return Ok(parsed);
        }
    }

    Err(SignatureError::Mismatch)
}

fn mac_verify(key: &[u8], signed: &[u8], sig: &[u8]) -> bool {
    // HMAC keys of any length are accepted; new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(signed);
    mac.verify_slice(sig).is_ok()
}

fn mac_sign(key: &[u8], signed: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(signed);
    mac.finalize().into_bytes().to_vec()
}

/// Builds an identity-style signature header for a payload. Used by tests
/// and local tooling to fabricate deliveries.
pub fn sign_identity(secret: &str, msg_id: &str, timestamp: &str, body: &[u8]) -> String {
    let key = BASE64
        .decode(secret.strip_prefix("whsec_").unwrap_or(secret))
        .expect("secret must be base64");
    let mut signed = format!("{msg_id}.{timestamp}.").into_bytes();
    signed.extend_from_slice(body);
    format!("v1,{}", BASE64.encode(mac_sign(&key, &signed)))
}

/// Builds a billing-style signature header for a payload.
pub fn sign_billing(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac_sign(secret.as_bytes(), &signed))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const BILLING_SECRET: &str = "whsec_test_billing";

    #[test]
    fn test_identity_round_trip_verifies() {
        let body = br#"{"type":"user.created"}"#;
        let header = sign_identity(IDENTITY_SECRET, "msg_1", "1700000000", body);
        assert_eq!(
            verify_identity_signature(IDENTITY_SECRET, "msg_1", "1700000000", &header, body),
            Ok(())
        );
    }

    #[test]
    fn test_identity_rejects_tampered_body() {
        let header = sign_identity(IDENTITY_SECRET, "msg_1", "1700000000", b"{}");
        assert_eq!(
            verify_identity_signature(
                IDENTITY_SECRET,
                "msg_1",
                "1700000000",
                &header,
                b"{\"evil\":true}"
            ),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_identity_rejects_wrong_msg_id() {
        let body = b"{}";
        let header = sign_identity(IDENTITY_SECRET, "msg_1", "1700000000", body);
        assert_eq!(
            verify_identity_signature(IDENTITY_SECRET, "msg_2", "1700000000", &header, body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_identity_secret_without_prefix_is_malformed() {
        assert_eq!(
            verify_identity_signature("nakedsecret", "m", "1", "v1,AAAA", b"{}"),
            Err(SignatureError::MalformedSecret)
        );
    }

    #[test]
    fn test_identity_header_without_v1_entries_is_malformed() {
        assert_eq!(
            verify_identity_signature(IDENTITY_SECRET, "m", "1", "v2,AAAA", b"{}"),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_identity_accepts_any_matching_entry() {
        let body = b"{}";
        let good = sign_identity(IDENTITY_SECRET, "msg_1", "1700000000", body);
        let header = format!("v1,bm90LWEtc2ln {good}");
        assert_eq!(
            verify_identity_signature(IDENTITY_SECRET, "msg_1", "1700000000", &header, body),
            Ok(())
        );
    }

    #[test]
    fn test_billing_round_trip_verifies() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_billing(BILLING_SECRET, 1700000000, body);
        assert_eq!(
            verify_billing_signature(BILLING_SECRET, &header, body),
            Ok(1700000000)
        );
    }

    #[test]
    fn test_billing_rejects_tampered_timestamp() {
        let body = b"{}";
        let header = sign_billing(BILLING_SECRET, 1700000000, body);
        let tampered = header.replace("t=1700000000", "t=1700000001");
        assert_eq!(
            verify_billing_signature(BILLING_SECRET, &tampered, body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_billing_missing_timestamp_is_malformed() {
        assert_eq!(
            verify_billing_signature(BILLING_SECRET, "v1=abcd", b"{}"),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_billing_missing_signature_is_malformed() {
        assert_eq!(
            verify_billing_signature(BILLING_SECRET, "t=1700000000", b"{}"),
            Err(SignatureError::MalformedHeader)
        );
    }
}
