//! # Shop Error Types
//!
//! Typed error handling for the forge-cart shop engine.
//! All shop operations return `Result<T, ShopError>`.

use thiserror::Error;
use uuid::Uuid;

/// Core error type for all shop operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing tokens, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller lacks the required permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Checkout was attempted against a cart with no items
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart not found for the given user or guest id
    #[error("Cart not found")]
    CartNotFound,

    /// Cart item not found
    #[error("Cart item not found: {item_id}")]
    CartItemNotFound { item_id: Uuid },

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: Uuid },

    /// Product SKU already taken
    #[error("Duplicate SKU: {sku}")]
    DuplicateSku { sku: String },

    /// Product is referenced by at least one order line and cannot be deleted
    #[error("Product {product_id} is referenced by existing orders")]
    ProductReferenced { product_id: Uuid },

    /// Store not found
    #[error("Store not found: {store_id}")]
    StoreNotFound { store_id: Uuid },

    /// Stock entry not found
    #[error("Stock entry not found: {entry_id}")]
    StockEntryNotFound { entry_id: Uuid },

    /// Stock adjustment would drive quantity below zero
    #[error("Stock adjustment would make entry {entry_id} negative")]
    NegativeStock { entry_id: Uuid },

    /// Stock transfer source holds less than the requested quantity
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Order not found
    #[error("Order not found")]
    OrderNotFound,

    /// Payment provider API error
    #[error("Gateway error: {message}")]
    Gateway { message: String },

    /// Network/HTTP error communicating with the payment provider
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook payment metadata carries no cart reference
    #[error("Payment metadata has no cart reference")]
    MissingCartReference,

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Unexpected failure inside the atomic checkout materialization
    #[error("Checkout processing failed: {0}")]
    Processing(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShopError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::InvalidRequest(_) => 400,
            ShopError::Forbidden(_) => 403,
            ShopError::EmptyCart => 400,
            ShopError::CartNotFound => 404,
            ShopError::CartItemNotFound { .. } => 404,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::DuplicateSku { .. } => 409,
            ShopError::ProductReferenced { .. } => 409,
            ShopError::StoreNotFound { .. } => 404,
            ShopError::StockEntryNotFound { .. } => 404,
            ShopError::NegativeStock { .. } => 400,
            ShopError::InsufficientStock { .. } => 400,
            ShopError::OrderNotFound => 404,
            ShopError::Gateway { .. } => 502,
            ShopError::Network(_) => 503,
            ShopError::MissingCartReference => 400,
            ShopError::WebhookVerificationFailed(_) => 401,
            ShopError::WebhookParseError(_) => 400,
            ShopError::Processing(_) => 500,
            ShopError::Serialization(_) => 500,
        }
    }

    /// Returns true if this error came from the payment provider boundary
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, ShopError::Gateway { .. } | ShopError::Network(_))
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
