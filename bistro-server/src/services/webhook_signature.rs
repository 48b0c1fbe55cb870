//! Gateway webhook signatures
//!
//! `Stripe-Signature: t=<unix seconds>,v1=<hex hmac>`; the MAC covers
//! `"{t}.{raw body}"` under the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Accepted clock skew between the gateway and us, in seconds
pub const TOLERANCE_SECS: i64 = 300;

/// Verify a webhook signature (HMAC-SHA256) against the current clock
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_at(payload: &[u8], sig_header: &str, secret: &str, now: i64) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    let mac = signed_mac(payload, timestamp, secret)?;
    // 密钥轮换期间可能带多个 v1
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err("Webhook signature mismatch")
    }
}

/// Header value for `payload` signed at `timestamp`
///
/// Used by local tooling that replays events against the webhook route.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, &'static str> {
    let mac = signed_mac(payload, &timestamp.to_string(), secret)?;
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signed_mac(payload: &[u8], timestamp: &str, secret: &str) -> Result<Hmac<Sha256>, &'static str> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}
