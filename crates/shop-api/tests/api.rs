//! End-to-end API tests over the full router with a scripted payment
//! gateway. No network calls leave the process.

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use shop_api::{routes, AppState};
use shop_core::{
    PaymentGateway, PaymentInfo, PaymentMetadata, PaymentPreference, PaymentStatus, PayerInfo,
    PreferenceItem, PreferenceMetadata, Price, Product, ShopData, ShopResult, ShopStore,
    StockEntry, Store,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// =============================================================================
// Test fixture
// =============================================================================

/// Gateway with scripted payment lookups
struct ScriptedGateway {
    payments: Mutex<HashMap<String, PaymentInfo>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
        }
    }

    fn script_approved(&self, payment_id: &str, cart_id: Uuid) {
        self.payments.lock().unwrap().insert(
            payment_id.to_string(),
            PaymentInfo {
                payment_id: payment_id.to_string(),
                status: PaymentStatus::Approved,
                metadata: PaymentMetadata {
                    cart_id: Some(cart_id),
                    user_id: None,
                },
                payer: PayerInfo {
                    email: Some("ana@example.com".to_string()),
                    name: Some("Ana Rojas".to_string()),
                    ..Default::default()
                },
            },
        );
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_preference(
        &self,
        _items: &[PreferenceItem],
        metadata: &PreferenceMetadata,
        _payer_email: Option<&str>,
    ) -> ShopResult<PaymentPreference> {
        Ok(PaymentPreference {
            preference_id: format!("pref-{}", metadata.cart_id),
            init_point: "https://pay.example/init".to_string(),
            sandbox_init_point: None,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> ShopResult<PaymentInfo> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or(shop_core::ShopError::Gateway {
                message: format!("unknown payment {payment_id}"),
            })
    }

    fn provider_name(&self) -> &'static str {
        "mercadopago"
    }
}

struct Fixture {
    server: TestServer,
    store: ShopStore,
    gateway: Arc<ScriptedGateway>,
    hammer_id: Uuid,
    drill_id: Uuid,
    entry_id: Uuid,
}

fn fixture() -> Fixture {
    let mut data = ShopData::default();
    let hammer_id = data
        .add_product(Product::new(
            "HAM-001",
            "Martillo Carpintero",
            Price::from_minor(12990, Default::default()),
            "herramientas",
        ))
        .unwrap();
    let drill_id = data
        .add_product(Product::new(
            "DRL-001",
            "Taladro Percutor",
            Price::from_minor(49990, Default::default()),
            "herramientas",
        ))
        .unwrap();
    let store_id = data.add_store(Store::new("Sucursal Centro"));
    let entry_id = data
        .add_stock_entry(StockEntry::new(hammer_id, store_id, 10))
        .unwrap();
    data.add_stock_entry(StockEntry::new(drill_id, store_id, 5))
        .unwrap();

    let store = ShopStore::with_data(data);
    let gateway = Arc::new(ScriptedGateway::new());
    let state = AppState::with_gateway(store.clone(), gateway.clone());
    let server = TestServer::new(routes::create_router(state)).unwrap();

    Fixture {
        server,
        store,
        gateway,
        hammer_id,
        drill_id,
        entry_id,
    }
}

fn header(name: &'static str, value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap(),
    )
}

/// Add a product to a guest cart, returning the cart id
async fn add_to_cart(fx: &Fixture, cart_id: Option<Uuid>, product_id: Uuid, quantity: u32) -> Uuid {
    let mut body = json!({ "product_id": product_id, "quantity": quantity });
    if let Some(cart_id) = cart_id {
        body["guest_cart_id"] = json!(cart_id);
    }
    let response = fx.server.post("/api/v1/cart/items").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["cart_id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fx = fixture();
    let response = fx.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_guest_cart_flow() {
    let fx = fixture();

    // Add creates the cart lazily
    let cart_id = add_to_cart(&fx, None, fx.hammer_id, 2).await;

    // Repeat add for the same product increments the line
    let same_cart = add_to_cart(&fx, Some(cart_id), fx.hammer_id, 1).await;
    assert_eq!(cart_id, same_cart);

    let response = fx
        .server
        .get("/api/v1/cart")
        .add_query_param("guest_cart_id", cart_id.to_string())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 3);
    assert_eq!(body["total"]["amount"], 3 * 12990);
}

#[tokio::test]
async fn test_cart_without_reference_is_empty_shape() {
    let fx = fixture();
    let response = fx.server.get("/api/v1/cart").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total"]["amount"], 0);
}

#[tokio::test]
async fn test_update_and_remove_cart_item() {
    let fx = fixture();
    let cart_id = add_to_cart(&fx, None, fx.hammer_id, 2).await;

    let snapshot: Value = fx
        .server
        .get("/api/v1/cart")
        .add_query_param("guest_cart_id", cart_id.to_string())
        .await
        .json();
    let item_id = snapshot["items"][0]["item_id"].as_str().unwrap().to_string();

    // Reassign quantity
    let response = fx
        .server
        .patch(&format!("/api/v1/cart/items/{item_id}"))
        .add_query_param("guest_cart_id", cart_id.to_string())
        .json(&json!({ "quantity": 5 }))
        .await;
    response.assert_status_ok();

    // Zero quantity is rejected
    let response = fx
        .server
        .patch(&format!("/api/v1/cart/items/{item_id}"))
        .add_query_param("guest_cart_id", cart_id.to_string())
        .json(&json!({ "quantity": 0 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Remove
    let response = fx
        .server
        .delete(&format!("/api/v1/cart/items/{item_id}"))
        .add_query_param("guest_cart_id", cart_id.to_string())
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let snapshot: Value = fx
        .server
        .get("/api/v1/cart")
        .add_query_param("guest_cart_id", cart_id.to_string())
        .await
        .json();
    assert!(snapshot["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_item_ownership_enforced() {
    let fx = fixture();
    let cart_id = add_to_cart(&fx, None, fx.hammer_id, 2).await;
    let other_cart = add_to_cart(&fx, None, fx.drill_id, 1).await;
    assert_ne!(cart_id, other_cart);

    let snapshot: Value = fx
        .server
        .get("/api/v1/cart")
        .add_query_param("guest_cart_id", cart_id.to_string())
        .await
        .json();
    let item_id = snapshot["items"][0]["item_id"].as_str().unwrap().to_string();

    // A different cart's owner cannot touch the item
    let response = fx
        .server
        .delete(&format!("/api/v1/cart/items/{item_id}"))
        .add_query_param("guest_cart_id", other_cart.to_string())
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_preference() {
    let fx = fixture();
    let cart_id = add_to_cart(&fx, None, fx.hammer_id, 1).await;

    let response = fx
        .server
        .post("/api/v1/checkout/preference")
        .json(&json!({ "guest_cart_id": cart_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["init_point"], "https://pay.example/init");
}

#[tokio::test]
async fn test_preference_for_empty_cart_fails() {
    let fx = fixture();
    let response = fx
        .server
        .post("/api/v1/checkout/preference")
        .json(&json!({}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_materializes_order_once() {
    let fx = fixture();
    let cart_id = add_to_cart(&fx, None, fx.hammer_id, 2).await;
    fx.gateway.script_approved("777", cart_id);

    let webhook_body = json!({ "type": "payment", "data": { "id": 777 } });

    let response = fx
        .server
        .post("/webhook/mercadopago")
        .json(&webhook_body)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "completed");
    let order_id = body["order_id"].as_str().unwrap().to_string();

    // Stock decremented at the first sufficient store
    let quantity = fx.store.read(|d| d.stock_entry(fx.entry_id).unwrap().quantity);
    assert_eq!(quantity, 8);

    // Duplicate notification is acknowledged without a second order
    let response = fx
        .server
        .post("/webhook/mercadopago")
        .json(&webhook_body)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "already_processed");

    let orders = fx.store.read(|d| d.orders.len());
    assert_eq!(orders, 1);

    // The order is visible by id and by payment id
    let response = fx.server.get(&format!("/api/v1/orders/{order_id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "paid");
    assert_eq!(body["payment_method"], "mercadopago");
    assert_eq!(body["total"]["amount"], 2 * 12990);

    let response = fx.server.get("/api/v1/orders/by-payment/777").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_webhook_ignores_non_payment_events() {
    let fx = fixture();
    let response = fx
        .server
        .post("/webhook/mercadopago")
        .json(&json!({ "type": "merchant_order", "data": { "id": 1 } }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_simulated_checkout() {
    let fx = fixture();
    let cart_id = add_to_cart(&fx, None, fx.drill_id, 1).await;

    let response = fx
        .server
        .post("/api/v1/checkout/simulate")
        .json(&json!({
            "guest_cart_id": cart_id,
            "name": "Carlos Soto",
            "email": "carlos@example.com"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["payment_id"].as_str().unwrap().starts_with("SIM-"));

    // Cart emptied, second simulate fails
    let response = fx
        .server
        .post("/api/v1/checkout/simulate")
        .json(&json!({ "guest_cart_id": cart_id }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_history_requires_user() {
    let fx = fixture();

    let response = fx.server.get("/api/v1/orders").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let user_id = Uuid::new_v4();
    let (name, value) = header("x-user-id", &user_id.to_string());
    let response = fx
        .server
        .get("/api/v1/orders")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_catalog_reads() {
    let fx = fixture();

    let response = fx.server.get("/api/v1/products").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 2);

    let response = fx
        .server
        .get(&format!("/api/v1/products/{}", fx.hammer_id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sku"], "HAM-001");

    let response = fx.server.get("/api/v1/products/categories").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["categories"], json!(["herramientas"]));
}

#[tokio::test]
async fn test_catalog_writes_are_permission_gated() {
    let fx = fixture();
    let new_product = json!({
        "sku": "PNT-001",
        "name": "Pintura Latex Blanca",
        "price": 8990.0,
        "category": "pinturas"
    });

    // Anonymous client is refused
    let response = fx.server.post("/api/v1/products").json(&new_product).await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    // Admin may create
    let (name, value) = header("x-user-role", "admin");
    let response = fx
        .server
        .post("/api/v1/products")
        .add_header(name, value)
        .json(&new_product)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    // Duplicate SKU is a conflict
    let (name, value) = header("x-user-role", "admin");
    let response = fx
        .server
        .post("/api/v1/products")
        .add_header(name, value)
        .json(&new_product)
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_worker_stock_management() {
    let fx = fixture();

    let (name, value) = header("x-user-role", "worker");
    let response = fx
        .server
        .post(&format!("/api/v1/stock/{}/adjust", fx.entry_id))
        .add_header(name, value)
        .json(&json!({ "delta": -3 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["quantity"], 7);

    // Driving the entry negative is rejected
    let (name, value) = header("x-user-role", "worker");
    let response = fx
        .server
        .post(&format!("/api/v1/stock/{}/adjust", fx.entry_id))
        .add_header(name, value)
        .json(&json!({ "delta": -100 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_inbox_roles() {
    let fx = fixture();

    // Public submission
    let response = fx
        .server
        .post("/api/v1/contact")
        .json(&json!({
            "name": "Pedro",
            "email": "pedro@example.com",
            "subject": "Consulta",
            "body": "¿Tienen despacho a regiones?"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    // Worker may not read the inbox
    let (name, value) = header("x-user-role", "worker");
    let response = fx
        .server
        .get("/api/v1/contact")
        .add_header(name, value)
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    // Admin may
    let (name, value) = header("x-user-role", "admin");
    let response = fx
        .server
        .get("/api/v1/contact")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["name"], "Pedro");
}

#[tokio::test]
async fn test_bad_identity_headers_rejected() {
    let fx = fixture();

    let (name, value) = header("x-user-role", "superuser");
    let response = fx
        .server
        .get("/api/v1/orders")
        .add_header(name, value)
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let (name, value) = header("x-user-id", "not-a-uuid");
    let response = fx
        .server
        .get("/api/v1/orders")
        .add_header(name, value)
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}
