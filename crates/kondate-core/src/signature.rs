//! Webhook signature verification.
//!
//! Both platforms reduce to "keyed HMAC-SHA256 over the raw body, compared in
//! constant time":
//! - Slack signs `v0:{timestamp}:{body}` and sends `v0=<hex>` in
//!   `X-Slack-Signature`, with the timestamp in `X-Slack-Request-Timestamp`.
//! - LINE signs the body with the channel secret and sends base64 in
//!   `X-Line-Signature`; event timestamps live inside the body.
//!
//! Verification is pure: inputs plus the caller-supplied `now`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::VerifyError;

type HmacSha256 = Hmac<Sha256>;

pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const LINE_SIGNATURE_HEADER: &str = "x-line-signature";

const SLACK_VERSION: &str = "v0";

/// Proof that a webhook body passed verification.
#[derive(Debug, Clone, Copy)]
pub struct Authentic {
    verified_at: DateTime<Utc>,
}

impl Authentic {
    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }
}

/// Reject if `|now - declared|` exceeds `window_secs`.
pub fn check_freshness(
    declared_secs: i64,
    now: DateTime<Utc>,
    window_secs: i64,
) -> Result<(), VerifyError> {
    let age_secs = (now.timestamp() - declared_secs).abs();
    if age_secs > window_secs {
        return Err(VerifyError::StaleTimestamp {
            age_secs,
            window_secs,
        });
    }
    Ok(())
}

fn mac(secret: &str) -> Result<HmacSha256, VerifyError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| VerifyError::SignatureMismatch)
}

/// Compute the Slack `v0=<hex>` signature for a body.
pub fn sign_slack(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let Ok(mut m) = mac(secret) else {
        return String::new();
    };
    m.update(format!("{SLACK_VERSION}:{timestamp}:").as_bytes());
    m.update(body);
    format!("{SLACK_VERSION}={}", hex::encode(m.finalize().into_bytes()))
}

/// Verify a Slack request.
pub fn verify_slack(
    secret: &str,
    body: &[u8],
    signature: &str,
    timestamp: &str,
    now: DateTime<Utc>,
    window_secs: i64,
) -> Result<Authentic, VerifyError> {
    let declared: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| VerifyError::MalformedTimestamp)?;

    let expected = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or(VerifyError::SignatureMismatch)?;

    let mut m = mac(secret)?;
    m.update(format!("{SLACK_VERSION}:{}:", timestamp.trim()).as_bytes());
    m.update(body);
    m.verify_slice(&expected)
        .map_err(|_| VerifyError::SignatureMismatch)?;

    check_freshness(declared, now, window_secs)?;
    Ok(Authentic { verified_at: now })
}

/// Compute the LINE base64 signature for a body.
pub fn sign_line(channel_secret: &str, body: &[u8]) -> String {
    let Ok(mut m) = mac(channel_secret) else {
        return String::new();
    };
    m.update(body);
    BASE64.encode(m.finalize().into_bytes())
}

/// Verify a LINE request.
///
/// `newest_event_secs` is the most recent event timestamp in the body, or
/// `None` when the body carries no events (nothing to replay).
pub fn verify_line(
    channel_secret: &str,
    body: &[u8],
    signature: &str,
    newest_event_secs: Option<i64>,
    now: DateTime<Utc>,
    window_secs: i64,
) -> Result<Authentic, VerifyError> {
    let expected = BASE64
        .decode(signature.trim())
        .map_err(|_| VerifyError::SignatureMismatch)?;

    let mut m = mac(channel_secret)?;
    m.update(body);
    m.verify_slice(&expected)
        .map_err(|_| VerifyError::SignatureMismatch)?;

    if let Some(declared) = newest_event_secs {
        check_freshness(declared, now, window_secs)?;
    }
    Ok(Authentic { verified_at: now })
}

/// Test-only proof for code that needs a `VerifiedRequest` without a signed body.
#[cfg(any(test, feature = "test-util"))]
pub fn authentic_for_tests(now: DateTime<Utc>) -> Authentic {
    Authentic { verified_at: now }
}
