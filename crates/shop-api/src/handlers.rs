//! # Request Handlers
//!
//! Axum request handlers for the storefront surface: cart, checkout,
//! orders, catalog reads and the contact form. Permission-gated
//! management handlers live in [`crate::admin`].

use crate::auth::RequestIdentity;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{CartRef, CheckoutDetails, ContactMessage, ShopError};
use shop_mercadopago::{parse_notification, verify_signature};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub(crate) fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

pub(crate) type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Query selecting a guest cart. Ignored for authenticated callers,
/// whose single cart is found by user id.
#[derive(Debug, Default, Deserialize)]
pub struct CartSelector {
    #[serde(default)]
    pub guest_cart_id: Option<Uuid>,
}

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Existing guest cart to add to (guests only)
    #[serde(default)]
    pub guest_cart_id: Option<Uuid>,
}

fn default_quantity() -> u32 {
    1
}

/// Add-to-cart response. `cart_id` doubles as the guest cart id the
/// client must echo back on later calls.
#[derive(Debug, Serialize)]
pub struct AddCartItemResponse {
    pub cart_id: Uuid,
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Cart line quantity update
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Checkout preference request body
#[derive(Debug, Default, Deserialize)]
pub struct CreatePreferenceRequest {
    #[serde(default)]
    pub guest_cart_id: Option<Uuid>,
}

/// Simulated checkout request: cart selector plus optional contact
/// fields, placeholder-filled when omitted
#[derive(Debug, Default, Deserialize)]
pub struct SimulateCheckoutRequest {
    #[serde(default)]
    pub guest_cart_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: CheckoutDetails,
}

/// Contact form submission
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve the caller's cart reference: the user's own cart, or the
/// guest cart they named. `None` when a guest named no cart.
fn resolve_cart_ref(identity: &RequestIdentity, guest_cart_id: Option<Uuid>) -> Option<CartRef> {
    match identity.user_id {
        Some(user_id) => Some(CartRef::User(user_id)),
        None => guest_cart_id.map(CartRef::Guest),
    }
}

/// Ownership check: the item must sit in the caller's cart
fn check_item_ownership(
    state: &AppState,
    identity: &RequestIdentity,
    guest_cart_id: Option<Uuid>,
    item_id: Uuid,
) -> Result<(), ShopError> {
    let cart_ref = resolve_cart_ref(identity, guest_cart_id)
        .ok_or(ShopError::CartItemNotFound { item_id })?;
    state.store.read(|data| {
        let cart = data.cart_for(cart_ref).ok_or(ShopError::CartItemNotFound { item_id })?;
        let item = data
            .cart_item(item_id)
            .ok_or(ShopError::CartItemNotFound { item_id })?;
        if item.cart_id != cart.id {
            return Err(ShopError::CartItemNotFound { item_id });
        }
        Ok(())
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "forge-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// -----------------------------------------------------------------------------
// Cart
// -----------------------------------------------------------------------------

/// Add a product to the caller's cart, lazily creating the cart
#[instrument(skip(state, identity, request), fields(product_id = %request.product_id))]
pub async fn add_cart_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<AddCartItemResponse>), HandlerError> {
    let item = state
        .store
        .transaction(|data| {
            let cart_id = data.ensure_cart(identity.user_id, request.guest_cart_id);
            data.add_cart_item(cart_id, request.product_id, request.quantity)
        })
        .map_err(shop_error_to_response)?;

    info!(cart_id = %item.cart_id, "added {} x {} to cart", item.quantity, item.product_id);

    Ok((
        StatusCode::CREATED,
        Json(AddCartItemResponse {
            cart_id: item.cart_id,
            item_id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
        }),
    ))
}

/// Reassign a cart line's quantity
#[instrument(skip(state, identity, selector))]
pub async fn update_cart_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(item_id): Path<Uuid>,
    Query(selector): Query<CartSelector>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    check_item_ownership(&state, &identity, selector.guest_cart_id, item_id)
        .map_err(shop_error_to_response)?;

    let item = state
        .store
        .transaction(|data| data.set_cart_item_quantity(item_id, request.quantity))
        .map_err(shop_error_to_response)?;

    Ok(Json(serde_json::json!({
        "item_id": item.id,
        "quantity": item.quantity
    })))
}

/// Remove one line from the caller's cart
#[instrument(skip(state, identity, selector))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(item_id): Path<Uuid>,
    Query(selector): Query<CartSelector>,
) -> Result<StatusCode, HandlerError> {
    check_item_ownership(&state, &identity, selector.guest_cart_id, item_id)
        .map_err(shop_error_to_response)?;

    state
        .store
        .transaction(|data| data.remove_cart_item(item_id))
        .map_err(shop_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Current cart contents and total. An absent cart is the empty shape,
/// not an error.
pub async fn get_cart(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Query(selector): Query<CartSelector>,
) -> Result<Json<shop_core::CartSnapshot>, HandlerError> {
    let Some(cart_ref) = resolve_cart_ref(&identity, selector.guest_cart_id) else {
        return Ok(Json(shop_core::CartSnapshot::empty()));
    };

    let snapshot = state
        .store
        .read(|data| data.cart_snapshot(cart_ref))
        .map_err(shop_error_to_response)?;

    Ok(Json(snapshot))
}

// -----------------------------------------------------------------------------
// Checkout
// -----------------------------------------------------------------------------

/// Create a payment preference for the caller's cart
#[instrument(skip(state, identity, request))]
pub async fn create_preference(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<CreatePreferenceRequest>,
) -> Result<Json<shop_core::PaymentPreference>, HandlerError> {
    let cart_ref = resolve_cart_ref(&identity, request.guest_cart_id)
        .ok_or_else(|| shop_error_to_response(ShopError::EmptyCart))?;

    let preference = state
        .checkout
        .create_payment_preference(cart_ref)
        .await
        .map_err(|e| {
            error!("Failed to create preference: {}", e);
            shop_error_to_response(e)
        })?;

    Ok(Json(preference))
}

/// Handle a MercadoPago webhook notification.
///
/// Notifications arrive at least once; every path that is not a
/// verification failure or a gateway outage must acknowledge with 200
/// or the provider keeps retrying.
#[instrument(skip(state, headers, body))]
pub async fn mercadopago_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, HandlerError> {
    let notification = parse_notification(&body).map_err(shop_error_to_response)?;

    let Some(notification) = notification else {
        // Not a payment event; acknowledge and move on
        return Ok(Json(serde_json::json!({ "outcome": "ignored" })));
    };

    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get("x-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                shop_error_to_response(ShopError::WebhookVerificationFailed(
                    "Missing x-signature header".to_string(),
                ))
            })?;
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        verify_signature(secret, signature, request_id, &notification.payment_id).map_err(|e| {
            warn!("Webhook rejected: {}", e);
            shop_error_to_response(e)
        })?;
    }

    info!(payment_id = %notification.payment_id, "webhook notification received");

    let outcome = state
        .checkout
        .reconcile_payment(&notification.payment_id)
        .await
        .map_err(|e| {
            error!("Reconciliation failed: {}", e);
            shop_error_to_response(e)
        })?;

    let body = serde_json::to_value(&outcome)
        .map_err(|e| shop_error_to_response(ShopError::Serialization(e.to_string())))?;
    Ok(Json(body))
}

/// Simulated checkout: materialize the cart as paid without a provider
#[instrument(skip(state, identity, request))]
pub async fn simulate_checkout(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<SimulateCheckoutRequest>,
) -> Result<(StatusCode, Json<shop_core::SimulatedCheckout>), HandlerError> {
    let cart_ref = resolve_cart_ref(&identity, request.guest_cart_id)
        .ok_or_else(|| shop_error_to_response(ShopError::EmptyCart))?;

    let result = state
        .checkout
        .simulate_checkout(cart_ref, request.details)
        .await
        .map_err(shop_error_to_response)?;

    Ok((StatusCode::CREATED, Json(result)))
}

// -----------------------------------------------------------------------------
// Orders
// -----------------------------------------------------------------------------

/// Get one order with its frozen lines
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<shop_core::OrderSnapshot>, HandlerError> {
    let snapshot = state
        .store
        .read(|data| data.order_snapshot(order_id))
        .map_err(shop_error_to_response)?;
    Ok(Json(snapshot))
}

/// Look an order up by the provider payment id
pub async fn get_order_by_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<shop_core::OrderSnapshot>, HandlerError> {
    let snapshot = state
        .store
        .read(|data| {
            let order_id = data
                .order_by_payment(&payment_id)
                .map(|o| o.id)
                .ok_or(ShopError::OrderNotFound)?;
            data.order_snapshot(order_id)
        })
        .map_err(shop_error_to_response)?;
    Ok(Json(snapshot))
}

/// The authenticated user's order history
pub async fn list_orders(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> Result<Json<serde_json::Value>, HandlerError> {
    let user_id = identity.user_id.ok_or_else(|| {
        shop_error_to_response(ShopError::InvalidRequest(
            "X-User-Id header required for order history".to_string(),
        ))
    })?;

    let orders = state
        .store
        .read(|data| {
            data.orders_of_user(user_id)
                .into_iter()
                .map(|o| data.order_snapshot(o.id))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(shop_error_to_response)?;

    let count = orders.len();
    Ok(Json(serde_json::json!({
        "orders": orders,
        "count": count
    })))
}

// -----------------------------------------------------------------------------
// Catalog (public reads)
// -----------------------------------------------------------------------------

/// List active products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.store.read(|data| {
        data.products
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect()
    });
    let count = products.len();
    Json(serde_json::json!({
        "products": products,
        "count": count
    }))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<shop_core::Product>, HandlerError> {
    let product = state
        .store
        .read(|data| data.product(product_id).cloned())
        .ok_or_else(|| shop_error_to_response(ShopError::ProductNotFound { product_id }))?;
    Ok(Json(product))
}

/// Distinct product categories
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let categories = state.store.read(|data| data.categories());
    Json(serde_json::json!({ "categories": categories }))
}

// -----------------------------------------------------------------------------
// Contact
// -----------------------------------------------------------------------------

/// Accept a contact form submission into the inbox
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), HandlerError> {
    if request.name.trim().is_empty() || request.email.trim().is_empty() || request.body.trim().is_empty() {
        return Err(shop_error_to_response(ShopError::InvalidRequest(
            "name, email and body are required".to_string(),
        )));
    }

    let message = ContactMessage::new(request.name, request.email, request.subject, request.body);
    let id = state
        .store
        .transaction(|data| Ok(data.add_message(message.clone())))
        .map_err(shop_error_to_response)?;

    info!(message_id = %id, "contact message received");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message_id": id })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert!(err.details.is_none());

        let err = err.with_details("quantity must be positive");
        assert_eq!(err.details.as_deref(), Some("quantity must be positive"));
    }

    #[test]
    fn test_shop_error_conversion() {
        let (status, _json) = shop_error_to_response(ShopError::EmptyCart);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _json) = shop_error_to_response(ShopError::Gateway {
            message: "down".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
