//! # Webhook Handling
//!
//! Parses MercadoPago webhook notifications and verifies their
//! `x-signature` header (HMAC-SHA256 over the manifest MercadoPago
//! documents: `id:{data_id};request-id:{request_id};ts:{ts};`).

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shop_core::{ShopError, ShopResult};
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Tolerance for webhook timestamp validation (5 minutes)
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// A payment notification extracted from a webhook payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookNotification {
    /// Provider payment id to reconcile
    pub payment_id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    // MercadoPago sends numeric ids in webhooks but string ids in
    // some sandbox payloads; accept both.
    id: serde_json::Value,
}

/// Parse a webhook body into a payment notification.
///
/// Returns `Ok(None)` for notification types we do not handle
/// (`merchant_order`, test pings, ...); those must be acknowledged,
/// not rejected, or the provider keeps retrying them.
pub fn parse_notification(body: &str) -> ShopResult<Option<WebhookNotification>> {
    let payload: WebhookPayload = serde_json::from_str(body)
        .map_err(|e| ShopError::WebhookParseError(format!("Invalid JSON: {}", e)))?;

    match payload.kind.as_deref() {
        Some("payment") => {}
        other => {
            debug!("ignoring webhook of type {:?}", other);
            return Ok(None);
        }
    }

    let data = payload
        .data
        .ok_or_else(|| ShopError::WebhookParseError("payment webhook missing data".to_string()))?;

    let payment_id = match data.id {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(ShopError::WebhookParseError(format!(
                "unexpected data.id: {}",
                other
            )))
        }
    };

    Ok(Some(WebhookNotification { payment_id }))
}

/// Verify a MercadoPago `x-signature` header.
///
/// The header carries `ts=<unix seconds>,v1=<hex hmac>`. The HMAC is
/// computed over `id:{data_id};request-id:{request_id};ts:{ts};` with
/// the webhook secret. Timestamps older than 5 minutes are rejected
/// to limit replay.
pub fn verify_signature(
    secret: &str,
    signature_header: &str,
    request_id: &str,
    data_id: &str,
) -> ShopResult<()> {
    let (ts, received_sig) = parse_signature_header(signature_header)?;

    // Reject stale timestamps (replay protection)
    let now = Utc::now().timestamp();
    if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        warn!("webhook timestamp outside tolerance: ts={}, now={}", ts, now);
        return Err(ShopError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let manifest = format!("id:{};request-id:{};ts:{};", data_id, request_id, ts);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ShopError::WebhookVerificationFailed(format!("Invalid secret: {}", e)))?;
    mac.update(manifest.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_compare(&expected, &received_sig) {
        warn!("webhook signature mismatch for data id {}", data_id);
        return Err(ShopError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Parse the `ts=...,v1=...` signature header
fn parse_signature_header(header: &str) -> ShopResult<(i64, String)> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<String> = None;

    for part in header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("ts"), Some(value)) => {
                timestamp = value.parse().ok();
            }
            (Some("v1"), Some(value)) => {
                signature = Some(value.to_string());
            }
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(ts), Some(sig)) => Ok((ts, sig)),
        _ => Err(ShopError::WebhookVerificationFailed(
            "Malformed signature header".to_string(),
        )),
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, data_id: &str, request_id: &str, ts: i64) -> String {
        let manifest = format!("id:{};request-id:{};ts:{};", data_id, request_id, ts);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(manifest.as_bytes());
        format!("ts={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_parse_payment_notification() {
        let body = r#"{"type":"payment","data":{"id":12345}}"#;
        let parsed = parse_notification(body).unwrap().unwrap();
        assert_eq!(parsed.payment_id, "12345");

        let body = r#"{"type":"payment","data":{"id":"67890"}}"#;
        let parsed = parse_notification(body).unwrap().unwrap();
        assert_eq!(parsed.payment_id, "67890");
    }

    #[test]
    fn test_other_notification_types_ignored() {
        let body = r#"{"type":"merchant_order","data":{"id":1}}"#;
        assert_eq!(parse_notification(body).unwrap(), None);

        let body = r#"{"action":"test"}"#;
        assert_eq!(parse_notification(body).unwrap(), None);
    }

    #[test]
    fn test_payment_without_data_is_parse_error() {
        let body = r#"{"type":"payment"}"#;
        let err = parse_notification(body).unwrap_err();
        assert!(matches!(err, ShopError::WebhookParseError(_)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_notification("not json").unwrap_err();
        assert!(matches!(err, ShopError::WebhookParseError(_)));
    }

    #[test]
    fn test_verify_valid_signature() {
        let secret = "whsec_test";
        let ts = Utc::now().timestamp();
        let header = sign(secret, "12345", "req-1", ts);
        assert!(verify_signature(secret, &header, "req-1", "12345").is_ok());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let ts = Utc::now().timestamp();
        let header = sign("whsec_test", "12345", "req-1", ts);
        let err = verify_signature("whsec_other", &header, "req-1", "12345").unwrap_err();
        assert!(matches!(err, ShopError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_verify_tampered_data_id() {
        let ts = Utc::now().timestamp();
        let header = sign("whsec_test", "12345", "req-1", ts);
        let err = verify_signature("whsec_test", &header, "req-1", "99999").unwrap_err();
        assert!(matches!(err, ShopError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_verify_stale_timestamp() {
        let secret = "whsec_test";
        let ts = Utc::now().timestamp() - 600;
        let header = sign(secret, "12345", "req-1", ts);
        let err = verify_signature(secret, &header, "req-1", "12345").unwrap_err();
        assert!(matches!(err, ShopError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_malformed_header() {
        let err = verify_signature("s", "garbage", "req-1", "12345").unwrap_err();
        assert!(matches!(err, ShopError::WebhookVerificationFailed(_)));
    }
}
