//! # Checkout Orchestrator
//!
//! The single authority that converts a non-empty cart into an
//! immutable order and reconciles store inventory, at most once per
//! successful payment event.
//!
//! Entry points:
//! - [`CheckoutService::create_payment_preference`] — build provider
//!   line items from a cart and ask the gateway for a preference.
//! - [`CheckoutService::reconcile_payment`] — webhook-driven: fetch the
//!   payment, and if approved, materialize the referenced cart.
//! - [`CheckoutService::simulate_checkout`] — synchronous equivalent
//!   for a cart paid out-of-band (demo/test path).
//!
//! Materialization (order + frozen line prices + stock decrement +
//! cart clear) runs inside one `ShopStore::transaction`, so a failure
//! anywhere rolls the whole event back.

use crate::cart::CartRef;
use crate::error::{ShopError, ShopResult};
use crate::gateway::{
    BoxedPaymentGateway, PaymentPreference, PaymentStatus, PreferenceItem, PreferenceMetadata,
};
use crate::money::Price;
use crate::order::{CheckoutDetails, Order, OrderItem};
use crate::store::{ShopData, ShopStore};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// A cart line no single store could satisfy. The order completes
/// anyway and no stock is decremented for the line; this is a recorded
/// policy, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OversoldLine {
    pub product_id: Uuid,
    pub requested: u32,
}

/// Result of reconciling one payment notification
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Payment not approved yet (or rejected); nothing was done
    NotApproved { status: PaymentStatus },
    /// The referenced cart was already empty: a duplicate notification
    AlreadyProcessed,
    /// An order was created and the cart emptied
    Completed {
        order_id: Uuid,
        oversold: Vec<OversoldLine>,
    },
}

/// Result of a simulated checkout
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedCheckout {
    pub order_id: Uuid,
    pub payment_id: String,
    pub oversold: Vec<OversoldLine>,
}

struct Materialized {
    order_id: Uuid,
    oversold: Vec<OversoldLine>,
}

/// Checkout orchestrator. The gateway is injected at construction;
/// there is no shared module-level client.
#[derive(Clone)]
pub struct CheckoutService {
    store: ShopStore,
    gateway: BoxedPaymentGateway,
}

impl CheckoutService {
    /// Create a service over the given store and gateway
    pub fn new(store: ShopStore, gateway: BoxedPaymentGateway) -> Self {
        Self { store, gateway }
    }

    /// The store this service operates on
    pub fn store(&self) -> &ShopStore {
        &self.store
    }

    /// Build a payment preference for a cart.
    ///
    /// Fails with `EmptyCart` before any gateway call when the cart is
    /// missing or has no items; gateway failures surface unchanged. No
    /// state is mutated either way.
    #[instrument(skip(self))]
    pub async fn create_payment_preference(
        &self,
        cart_ref: CartRef,
    ) -> ShopResult<PaymentPreference> {
        let (metadata, items, payer_email) = self.store.read(|data| {
            let cart = data.cart_for(cart_ref).ok_or(ShopError::EmptyCart)?;
            let cart_items = data.cart_items_of(cart.id);
            if cart_items.is_empty() {
                return Err(ShopError::EmptyCart);
            }

            let mut items = Vec::with_capacity(cart_items.len());
            for item in cart_items {
                let product =
                    data.product(item.product_id)
                        .ok_or(ShopError::ProductNotFound {
                            product_id: item.product_id,
                        })?;
                items.push(PreferenceItem {
                    title: product.name.clone(),
                    quantity: item.quantity,
                    unit_price: product.price.clone(),
                });
            }

            let payer_email = cart
                .user_id
                .and_then(|uid| data.user(uid))
                .map(|u| u.email.clone());

            Ok((
                PreferenceMetadata {
                    cart_id: cart.id,
                    user_id: cart.user_id,
                },
                items,
                payer_email,
            ))
        })?;

        info!(
            cart_id = %metadata.cart_id,
            lines = items.len(),
            "creating payment preference"
        );

        self.gateway
            .create_preference(&items, &metadata, payer_email.as_deref())
            .await
    }

    /// Reconcile a provider payment notification.
    ///
    /// Idempotent: only an approved payment whose referenced cart still
    /// has items materializes an order. Duplicate notifications find an
    /// empty cart and report `AlreadyProcessed`. The empty-check and
    /// the materialization share one transaction, so concurrent
    /// duplicates cannot double-materialize.
    #[instrument(skip(self))]
    pub async fn reconcile_payment(&self, payment_id: &str) -> ShopResult<ReconcileOutcome> {
        let payment = self.gateway.get_payment(payment_id).await?;

        if !payment.status.is_approved() {
            info!(payment_id, status = ?payment.status, "payment not approved, nothing to do");
            return Ok(ReconcileOutcome::NotApproved {
                status: payment.status,
            });
        }

        let cart_id = payment
            .metadata
            .cart_id
            .ok_or(ShopError::MissingCartReference)?;
        let details = CheckoutDetails::from_payer(&payment.payer);
        let method = self.gateway.provider_name();

        let outcome = self.store.transaction(|data| {
            if data.cart_items_of(cart_id).is_empty() {
                info!(payment_id, %cart_id, "cart already empty, duplicate notification");
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }
            let materialized = materialize(
                data,
                cart_id,
                payment.metadata.user_id,
                &payment.payment_id,
                method,
                details.clone(),
            )
            .map_err(|e| {
                error!(payment_id, %cart_id, "materialization failed: {e}");
                ShopError::Processing(e.to_string())
            })?;
            Ok(ReconcileOutcome::Completed {
                order_id: materialized.order_id,
                oversold: materialized.oversold,
            })
        })?;

        if let ReconcileOutcome::Completed { order_id, .. } = &outcome {
            info!(payment_id, %order_id, "payment reconciled into order");
        }
        Ok(outcome)
    }

    /// Synchronous checkout for a cart paid by out-of-band means.
    /// Generates a synthetic payment id and runs the identical
    /// materialization atomically.
    #[instrument(skip(self, details))]
    pub async fn simulate_checkout(
        &self,
        cart_ref: CartRef,
        details: CheckoutDetails,
    ) -> ShopResult<SimulatedCheckout> {
        let payment_id = format!("SIM-{}", Uuid::new_v4());

        let result = self.store.transaction(|data| {
            let cart = data.cart_for(cart_ref).ok_or(ShopError::EmptyCart)?;
            let cart_id = cart.id;
            let user_id = cart.user_id;
            if data.cart_items_of(cart_id).is_empty() {
                return Err(ShopError::EmptyCart);
            }
            let materialized = materialize(
                data,
                cart_id,
                user_id,
                &payment_id,
                "simulated",
                details.clone(),
            )
            .map_err(|e| match e {
                ShopError::EmptyCart => e,
                other => {
                    error!(%cart_id, "simulated checkout failed: {other}");
                    ShopError::Processing(other.to_string())
                }
            })?;
            Ok(SimulatedCheckout {
                order_id: materialized.order_id,
                payment_id: payment_id.clone(),
                oversold: materialized.oversold,
            })
        })?;

        info!(order_id = %result.order_id, payment_id = %result.payment_id, "simulated checkout completed");
        Ok(result)
    }
}

/// Materialization: given a non-empty cart and an already-approved
/// payment, inside an open transaction:
///
/// 1. total = sum of quantity x current product price
/// 2. create the Order at `Paid` with the payment id and contact fields
/// 3. create OrderItems with the price frozen at this instant
/// 4. decrement stock per line: first entry for the product (in
///    insertion order) holding at least the requested quantity; if
///    none, record the line as oversold and decrement nothing
/// 5. delete all cart items (the cart row survives)
fn materialize(
    data: &mut ShopData,
    cart_id: Uuid,
    user_id: Option<Uuid>,
    payment_id: &str,
    payment_method: &str,
    details: CheckoutDetails,
) -> ShopResult<Materialized> {
    // Snapshot the lines with current prices before any mutation.
    let mut lines: Vec<(Uuid, u32, Price)> = Vec::new();
    for item in data.cart_items_of(cart_id) {
        let product = data
            .product(item.product_id)
            .ok_or(ShopError::ProductNotFound {
                product_id: item.product_id,
            })?;
        lines.push((item.product_id, item.quantity, product.price.clone()));
    }
    if lines.is_empty() {
        return Err(ShopError::EmptyCart);
    }

    // Totals are summed in minor units, which is only meaningful in a
    // single currency; a mixed cart is a corrupt state, not a policy.
    let currency = lines[0].2.currency;
    if lines.iter().any(|(_, _, price)| price.currency != currency) {
        return Err(ShopError::Processing(
            "cart mixes currencies".to_string(),
        ));
    }
    let total: i64 = lines
        .iter()
        .map(|(_, qty, price)| price.times(*qty).amount)
        .sum();

    let order = Order::paid(
        user_id,
        Price::from_minor(total, currency),
        details.resolve(),
        payment_method,
        payment_id,
    );
    let order_id = order.id;
    data.orders.push(order);

    for (product_id, quantity, unit_price) in &lines {
        data.order_items.push(OrderItem::new(
            order_id,
            *product_id,
            *quantity,
            unit_price.clone(),
        ));
    }

    // Per-line stock decrement: first sufficient entry wins, scanning
    // in insertion order. A line no single entry can satisfy is
    // oversold: logged, returned, and left undecremented.
    let mut oversold = Vec::new();
    for (product_id, quantity, _) in &lines {
        let entry = data
            .stock
            .iter_mut()
            .filter(|e| e.product_id == *product_id)
            .find(|e| e.quantity >= *quantity);
        match entry {
            Some(entry) => {
                entry.quantity -= quantity;
                if entry.is_below_threshold() {
                    warn!(
                        entry_id = %entry.id,
                        quantity = entry.quantity,
                        threshold = entry.min_threshold,
                        "stock entry below restock threshold"
                    );
                }
            }
            None => {
                warn!(
                    %order_id,
                    %product_id,
                    requested = quantity,
                    "oversold line: no single store holds enough stock"
                );
                oversold.push(OversoldLine {
                    product_id: *product_id,
                    requested: *quantity,
                });
            }
        }
    }

    data.clear_cart(cart_id);

    Ok(Materialized { order_id, oversold })
}
