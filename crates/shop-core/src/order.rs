//! # Order Types
//!
//! Orders are the permanent record of a completed purchase. Line items
//! freeze the unit price at order time, so later catalog price changes
//! never rewrite history.

use crate::gateway::PayerInfo;
use crate::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

/// Contact and shipping fields attached to an order. All fields are
/// optional on the way in; [`CheckoutDetails::resolve`] fills the gaps
/// with placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Fully resolved contact/shipping fields
#[derive(Debug, Clone)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl CheckoutDetails {
    /// Build details from the payment provider's payer info
    pub fn from_payer(payer: &PayerInfo) -> Self {
        Self {
            name: payer.name.clone(),
            email: payer.email.clone(),
            phone: payer.phone.clone(),
            address: payer.address.clone(),
            city: payer.city.clone(),
            postal_code: payer.postal_code.clone(),
        }
    }

    /// Resolve missing fields to placeholder values
    pub fn resolve(self) -> ContactInfo {
        ContactInfo {
            name: self.name.unwrap_or_else(|| "Guest".to_string()),
            email: self
                .email
                .unwrap_or_else(|| "guest@example.invalid".to_string()),
            phone: self.phone.unwrap_or_else(|| "N/A".to_string()),
            address: self.address.unwrap_or_else(|| "N/A".to_string()),
            city: self.city.unwrap_or_else(|| "N/A".to_string()),
            postal_code: self.postal_code.unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// A completed purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: Uuid,

    /// Owning user, if the purchase was authenticated
    pub user_id: Option<Uuid>,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Total amount at creation time
    pub total: Price,

    /// Contact information
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Shipping information
    pub address: String,
    pub city: String,
    pub postal_code: String,

    /// Payment method (e.g., "mercadopago", "simulated")
    pub payment_method: String,

    /// External payment identifier, unique per payment
    pub payment_id: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a paid order from resolved checkout fields
    pub fn paid(
        user_id: Option<Uuid>,
        total: Price,
        contact: ContactInfo,
        payment_method: impl Into<String>,
        payment_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: OrderStatus::Paid,
            total,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            address: contact.address,
            city: contact.city,
            postal_code: contact.postal_code,
            payment_method: payment_method.into(),
            payment_id: Some(payment_id.into()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A line of an order. Immutable once created; `unit_price` is the
/// product price at the instant of checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line identifier
    pub id: Uuid,

    /// Order this line belongs to
    pub order_id: Uuid,

    /// Product purchased
    pub product_id: Uuid,

    /// Units purchased
    pub quantity: u32,

    /// Unit price frozen at order time
    pub unit_price: Price,
}

impl OrderItem {
    /// Create a new order line
    pub fn new(order_id: Uuid, product_id: Uuid, quantity: u32, unit_price: Price) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Line subtotal (quantity x frozen unit price)
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Serializable view of one order line with product name joined in
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

/// Serializable view of a whole order
#[derive(Debug, Clone, Serialize)]
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total: Price,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub payment_method: String,
    pub payment_id: Option<String>,
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_order_item_subtotal() {
        let item = OrderItem::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            3,
            Price::new(10.0, Currency::USD),
        );
        assert_eq!(item.subtotal().amount, 3000);
    }

    #[test]
    fn test_details_resolve_placeholders() {
        let details = CheckoutDetails {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        let contact = details.resolve();

        assert_eq!(contact.email, "ana@example.com");
        assert_eq!(contact.name, "Guest");
        assert_eq!(contact.city, "N/A");
    }
}
