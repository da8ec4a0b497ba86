//! # Payment Gateway Trait
//!
//! Boundary between the checkout core and the payment provider.
//! The provider (MercadoPago in production) is an opaque remote
//! service: the core only creates payment preferences and reads
//! payment status back. Implementations are injected into
//! [`crate::checkout::CheckoutService`] rather than shared as a
//! module-level singleton.

use crate::error::ShopResult;
use crate::money::Price;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One purchase line sent to the provider when creating a preference
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    /// Product display name
    pub title: String,
    /// Units requested
    pub quantity: u32,
    /// Current unit price
    pub unit_price: Price,
}

/// Metadata binding a payment preference to our cart
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceMetadata {
    /// Cart the payment settles
    pub cart_id: Uuid,
    /// Authenticated user, if any
    pub user_id: Option<Uuid>,
}

/// A provider-side payment preference (initiated, not yet settled)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPreference {
    /// Provider's preference identifier
    pub preference_id: String,
    /// URL the customer is redirected to for payment
    pub init_point: String,
    /// Sandbox redirect URL, if the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_init_point: Option<String>,
}

/// Provider-reported payment status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Pending,
    Rejected,
    Other(String),
}

impl PaymentStatus {
    /// Map a provider status string onto our vocabulary
    pub fn parse(status: &str) -> Self {
        match status {
            "approved" => PaymentStatus::Approved,
            "pending" | "in_process" => PaymentStatus::Pending,
            "rejected" => PaymentStatus::Rejected,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    /// Only approved payments materialize orders
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }
}

/// Payer details reported by the provider, used to fill order contact
/// fields. Everything is optional; gaps become placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayerInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Metadata read back from a payment. `cart_id` is required for
/// reconciliation; its absence is a malformed notification.
#[derive(Debug, Clone, Default)]
pub struct PaymentMetadata {
    pub cart_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Status and metadata of one provider-side payment
#[derive(Debug, Clone)]
pub struct PaymentInfo {
    /// Provider's payment identifier
    pub payment_id: String,
    /// Settlement status
    pub status: PaymentStatus,
    /// Metadata we attached at preference time
    pub metadata: PaymentMetadata,
    /// Payer details
    pub payer: PayerInfo,
}

/// Core trait for payment provider clients.
///
/// Both calls are bounded external requests; failures surface as
/// `ShopError::Gateway`/`ShopError::Network` and are never retried here.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment preference for the given lines.
    ///
    /// Returns the provider's preference id and redirect URLs, or a
    /// gateway error if the call fails or the response is malformed.
    async fn create_preference(
        &self,
        items: &[PreferenceItem],
        metadata: &PreferenceMetadata,
        payer_email: Option<&str>,
    ) -> ShopResult<PaymentPreference>;

    /// Fetch the status and metadata of a payment by provider id
    async fn get_payment(&self, payment_id: &str) -> ShopResult<PaymentInfo>;

    /// Provider name (for logging and the order's payment_method field)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(PaymentStatus::parse("approved"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::parse("pending"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::parse("in_process"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::parse("rejected"), PaymentStatus::Rejected);
        assert_eq!(
            PaymentStatus::parse("charged_back"),
            PaymentStatus::Other("charged_back".to_string())
        );
    }

    #[test]
    fn test_only_approved_materializes() {
        assert!(PaymentStatus::Approved.is_approved());
        assert!(!PaymentStatus::Pending.is_approved());
        assert!(!PaymentStatus::Other("refunded".into()).is_approved());
    }
}
