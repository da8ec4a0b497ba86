//! # shop-api
//!
//! HTTP API layer for forge-cart-rs, built on Axum.
//!
//! Exposes the storefront surface (catalog, cart, checkout, orders,
//! contact form) and the permission-gated management surface (catalog
//! and stock administration, contact inbox). Identity arrives
//! pre-authenticated in headers; see [`auth::RequestIdentity`].

pub mod admin;
pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use state::{AppConfig, AppState};
