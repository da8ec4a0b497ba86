//! # Catalog Types
//!
//! Products, stores and per-store stock entries.

use crate::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: Uuid,

    /// Stock keeping unit, unique across the catalog
    pub sku: String,

    /// Display name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Current selling price
    pub price: Price,

    /// Category (e.g., "herramientas", "fijaciones")
    pub category: String,

    /// Brand name
    #[serde(default)]
    pub brand: String,

    /// Whether this product is available for purchase
    #[serde(default = "default_true")]
    pub active: bool,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a new product
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Price,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sku: sku.into(),
            name: name.into(),
            description: String::new(),
            price,
            category: category.into(),
            brand: String::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set brand
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }
}

/// A physical store holding stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    /// Unique store identifier
    pub id: Uuid,

    /// Display name (e.g., "Sucursal Centro")
    pub name: String,

    /// Whether this store is active
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Store {
    /// Create a new active store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active: true,
        }
    }
}

/// Quantity of one product available at one store.
///
/// The (product, store) pair is unique; quantity is unsigned so it can
/// never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    /// Unique entry identifier
    pub id: Uuid,

    /// Product this entry tracks
    pub product_id: Uuid,

    /// Store holding the stock
    pub store_id: Uuid,

    /// Units on hand
    pub quantity: u32,

    /// Restock alert threshold
    #[serde(default)]
    pub min_threshold: u32,
}

impl StockEntry {
    /// Create a new stock entry
    pub fn new(product_id: Uuid, store_id: Uuid, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            store_id,
            quantity,
            min_threshold: 0,
        }
    }

    /// Builder: set the restock alert threshold
    pub fn with_min_threshold(mut self, threshold: u32) -> Self {
        self.min_threshold = threshold;
        self
    }

    /// Whether the entry has fallen below its restock threshold
    pub fn is_below_threshold(&self) -> bool {
        self.quantity < self.min_threshold
    }
}
