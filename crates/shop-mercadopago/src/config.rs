//! # MercadoPago Configuration
//!
//! Configuration management for the MercadoPago integration.
//! All secrets are loaded from environment variables.

use shop_core::ShopError;
use std::env;

/// MercadoPago API configuration
#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    /// Access token (APP_USR-... or TEST-...)
    pub access_token: String,

    /// Webhook signing secret
    pub webhook_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Frontend base URL the provider redirects back to
    pub back_url_base: String,
}

impl MercadoPagoConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `MP_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `MP_WEBHOOK_SECRET` (webhook signature verification is skipped
    ///   without it)
    /// - `CHECKOUT_BASE_URL` (defaults to the local dev frontend)
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let access_token = env::var("MP_ACCESS_TOKEN")
            .map_err(|_| ShopError::Configuration("MP_ACCESS_TOKEN not set".to_string()))?;

        if !access_token.starts_with("APP_USR-") && !access_token.starts_with("TEST-") {
            return Err(ShopError::Configuration(
                "MP_ACCESS_TOKEN must start with APP_USR- or TEST-".to_string(),
            ));
        }

        let webhook_secret = env::var("MP_WEBHOOK_SECRET").ok();
        let back_url_base = env::var("CHECKOUT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            access_token,
            webhook_secret,
            api_base_url: "https://api.mercadopago.com".to_string(),
            back_url_base,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            webhook_secret: None,
            api_base_url: "https://api.mercadopago.com".to_string(),
            back_url_base: "http://localhost:5173".to_string(),
        }
    }

    /// Check if using sandbox credentials
    pub fn is_test_mode(&self) -> bool {
        self.access_token.starts_with("TEST-")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set the webhook signing secret
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Redirect URLs the provider sends the customer back to
    pub fn back_urls(&self) -> BackUrls {
        BackUrls {
            success: format!("{}/checkout/success", self.back_url_base),
            failure: format!("{}/checkout/failure", self.back_url_base),
            pending: format!("{}/checkout/pending", self.back_url_base),
        }
    }
}

/// Provider redirect URLs
#[derive(Debug, Clone, serde::Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}
