//! # MercadoPago Gateway Client
//!
//! Implementation of `PaymentGateway` against the MercadoPago REST API:
//! preference creation (`POST /checkout/preferences`) and payment
//! lookup (`GET /v1/payments/{id}`).

use crate::config::MercadoPagoConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shop_core::{
    PaymentGateway, PaymentInfo, PaymentMetadata, PaymentPreference, PaymentStatus, PayerInfo,
    PreferenceItem, PreferenceMetadata, ShopError, ShopResult,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// MercadoPago payment gateway
pub struct MercadoPagoGateway {
    config: MercadoPagoConfig,
    client: Client,
}

impl MercadoPagoGateway {
    /// Create a new gateway client
    pub fn new(config: MercadoPagoConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        let config = MercadoPagoConfig::from_env()?;
        Ok(Self::new(config))
    }

    fn preference_payload(
        &self,
        items: &[PreferenceItem],
        metadata: &PreferenceMetadata,
        payer_email: Option<&str>,
    ) -> MpPreferenceRequest {
        MpPreferenceRequest {
            items: items
                .iter()
                .map(|item| MpItem {
                    title: item.title.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.as_decimal(),
                    currency_id: item.unit_price.currency.as_str().to_string(),
                })
                .collect(),
            back_urls: self.config.back_urls(),
            external_reference: metadata.cart_id.to_string(),
            metadata: MpMetadata {
                cart_id: metadata.cart_id.to_string(),
                user_id: metadata.user_id.map(|u| u.to_string()),
            },
            payer: payer_email.map(|email| MpPayerRequest {
                email: email.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    #[instrument(skip(self, items, metadata), fields(cart_id = %metadata.cart_id))]
    async fn create_preference(
        &self,
        items: &[PreferenceItem],
        metadata: &PreferenceMetadata,
        payer_email: Option<&str>,
    ) -> ShopResult<PaymentPreference> {
        let payload = self.preference_payload(items, metadata, payer_email);

        debug!("creating MercadoPago preference: {} items", payload.items.len());

        let url = format!("{}/checkout/preferences", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("MercadoPago API error: status={}, body={}", status, body);

            if let Ok(err) = serde_json::from_str::<MpErrorResponse>(&body) {
                return Err(ShopError::Gateway {
                    message: err.message,
                });
            }
            return Err(ShopError::Gateway {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: MpPreferenceResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse preference response: {}", e))
        })?;

        // A response without the identifier fields is as bad as an
        // error status: refuse it before anyone redirects a customer.
        let preference_id = parsed.id.ok_or_else(|| ShopError::Gateway {
            message: "preference response missing id".to_string(),
        })?;
        let init_point = parsed.init_point.ok_or_else(|| ShopError::Gateway {
            message: "preference response missing init_point".to_string(),
        })?;

        info!("created MercadoPago preference: id={}", preference_id);

        Ok(PaymentPreference {
            preference_id,
            init_point,
            sandbox_init_point: parsed.sandbox_init_point,
        })
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> ShopResult<PaymentInfo> {
        let url = format!("{}/v1/payments/{}", self.config.api_base_url, payment_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("MercadoPago payment lookup failed: status={}, body={}", status, body);
            if let Ok(err) = serde_json::from_str::<MpErrorResponse>(&body) {
                return Err(ShopError::Gateway {
                    message: err.message,
                });
            }
            return Err(ShopError::Gateway {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: MpPaymentResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse payment response: {}", e))
        })?;

        // Payment ids come back numeric; string ids in sandbox payloads
        let payment_id = match &parsed.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        debug!("payment {}: status={}", payment_id, parsed.status);

        let metadata = PaymentMetadata {
            cart_id: parsed
                .metadata
                .as_ref()
                .and_then(|m| m.cart_id.as_deref())
                .and_then(|s| Uuid::parse_str(s).ok()),
            user_id: parsed
                .metadata
                .as_ref()
                .and_then(|m| m.user_id.as_deref())
                .and_then(|s| Uuid::parse_str(s).ok()),
        };

        let payer = parsed
            .payer
            .map(|p| PayerInfo {
                email: p.email,
                name: match (p.first_name, p.last_name) {
                    (Some(first), Some(last)) => Some(format!("{first} {last}")),
                    (Some(first), None) => Some(first),
                    (None, Some(last)) => Some(last),
                    (None, None) => None,
                },
                phone: p.phone.and_then(|ph| ph.number),
                address: p.address.as_ref().and_then(|a| a.street_name.clone()),
                city: p.address.as_ref().and_then(|a| a.city.clone()),
                postal_code: p.address.and_then(|a| a.zip_code),
            })
            .unwrap_or_default();

        Ok(PaymentInfo {
            payment_id,
            status: PaymentStatus::parse(&parsed.status),
            metadata,
            payer,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mercadopago"
    }
}

// =============================================================================
// MercadoPago API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct MpPreferenceRequest {
    items: Vec<MpItem>,
    back_urls: crate::config::BackUrls,
    external_reference: String,
    metadata: MpMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<MpPayerRequest>,
}

#[derive(Debug, Serialize)]
struct MpItem {
    title: String,
    quantity: u32,
    unit_price: f64,
    currency_id: String,
}

#[derive(Debug, Serialize)]
struct MpMetadata {
    cart_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct MpPayerRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct MpPreferenceResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    init_point: Option<String>,
    #[serde(default)]
    sandbox_init_point: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MpPaymentResponse {
    id: serde_json::Value,
    status: String,
    #[serde(default)]
    metadata: Option<MpPaymentMetadata>,
    #[serde(default)]
    payer: Option<MpPayerResponse>,
}

#[derive(Debug, Deserialize)]
struct MpPaymentMetadata {
    #[serde(default)]
    cart_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpPayerResponse {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<MpPhone>,
    #[serde(default)]
    address: Option<MpAddress>,
}

#[derive(Debug, Deserialize)]
struct MpPhone {
    #[serde(default)]
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpAddress {
    #[serde(default)]
    street_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    zip_code: Option<String>,
}
