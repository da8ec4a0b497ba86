//! # shop-core
//!
//! Core domain model and checkout orchestration for forge-cart-rs.
//!
//! This crate provides:
//! - `Product`, `Store` and `StockEntry` for the multi-store catalog
//! - `Cart`/`CartItem` (transient) and `Order`/`OrderItem` (permanent)
//! - `ShopStore`, an in-memory store with an atomic unit of work
//! - `PaymentGateway` trait for payment provider clients
//! - `CheckoutService`, the orchestrator that turns a paid cart into an
//!   order and reconciles stock
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CartRef, CheckoutService, ShopStore};
//!
//! let store = ShopStore::new();
//! let checkout = CheckoutService::new(store.clone(), gateway);
//!
//! // Ask the provider for a payment preference
//! let pref = checkout.create_payment_preference(CartRef::User(user_id)).await?;
//!
//! // Later, a provider webhook reports the payment id
//! let outcome = checkout.reconcile_payment(&payment_id).await?;
//! ```

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod money;
pub mod order;
pub mod store;

// Re-exports for convenience
pub use account::{Permission, Role, UserAccount};
pub use cart::{Cart, CartItem, CartLine, CartRef, CartSnapshot};
pub use catalog::{Product, StockEntry, Store};
pub use checkout::{CheckoutService, OversoldLine, ReconcileOutcome, SimulatedCheckout};
pub use contact::ContactMessage;
pub use error::{ShopError, ShopResult};
pub use gateway::{
    BoxedPaymentGateway, PaymentGateway, PaymentInfo, PaymentMetadata, PaymentPreference,
    PaymentStatus, PayerInfo, PreferenceItem, PreferenceMetadata,
};
pub use money::{Currency, Price};
pub use order::{CheckoutDetails, Order, OrderItem, OrderLine, OrderSnapshot, OrderStatus};
pub use store::{ShopData, ShopStore};
