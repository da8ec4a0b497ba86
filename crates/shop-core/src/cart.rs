//! # Cart Types
//!
//! Transient shopping carts for authenticated users and guests.
//! A cart is working state only; checkout empties it and the permanent
//! record lives in [`crate::order`].

use crate::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a caller refers to a cart: by the owning user, or by the
/// guest cart's own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRef {
    /// The single cart of an authenticated user
    User(Uuid),
    /// A guest cart identified by its own id
    Guest(Uuid),
}

/// A shopping cart. At most one per authenticated user; guest carts
/// have no owner and are addressed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Unique cart identifier
    pub id: Uuid,

    /// Owning user, if any
    pub user_id: Option<Uuid>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create a cart for a user (or a guest cart when `user_id` is None)
    pub fn new(user_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a guest cart with a caller-chosen id
    pub fn guest_with_id(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One product line inside a cart. The (cart, product) pair is unique;
/// repeat adds increment the quantity instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique item identifier
    pub id: Uuid,

    /// Cart this item belongs to
    pub cart_id: Uuid,

    /// Product being purchased
    pub product_id: Uuid,

    /// Units requested, always >= 1
    pub quantity: u32,

    /// When the line was first added
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Create a new cart line
    pub fn new(cart_id: Uuid, product_id: Uuid, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        }
    }
}

/// Serializable view of one cart line with product data joined in
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub subtotal: Price,
}

/// Serializable view of a whole cart
#[derive(Debug, Clone, Serialize)]
pub struct CartSnapshot {
    pub cart_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub items: Vec<CartLine>,
    pub total: Price,
}

impl CartSnapshot {
    /// The empty shape returned when no cart exists yet
    pub fn empty() -> Self {
        Self {
            cart_id: None,
            user_id: None,
            items: Vec::new(),
            total: Price::zero(Default::default()),
        }
    }
}
