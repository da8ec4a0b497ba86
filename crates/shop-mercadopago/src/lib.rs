//! # shop-mercadopago
//!
//! MercadoPago payment gateway client for forge-cart-rs.
//!
//! This crate implements the `shop_core::PaymentGateway` trait against
//! MercadoPago's Checkout Pro API:
//! - `MercadoPagoGateway` for preference creation and payment lookup
//! - `webhook` for notification parsing and `x-signature` verification
//! - `MercadoPagoConfig` for environment-based configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_mercadopago::MercadoPagoGateway;
//!
//! let gateway = MercadoPagoGateway::from_env()?;
//! let checkout = CheckoutService::new(store, Arc::new(gateway));
//! ```

pub mod client;
pub mod config;
pub mod webhook;

pub use client::MercadoPagoGateway;
pub use config::{BackUrls, MercadoPagoConfig};
pub use webhook::{parse_notification, verify_signature, WebhookNotification};
