//! # Management Handlers
//!
//! Catalog, store and stock management plus the contact inbox.
//! Every handler here checks a permission on the caller's resolved
//! role before touching the store.

use crate::auth::RequestIdentity;
use crate::handlers::{shop_error_to_response, HandlerError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shop_core::{Permission, Price, Product, ShopError, StockEntry, Store};
use tracing::{info, instrument};
use uuid::Uuid;

// =============================================================================
// Request Types
// =============================================================================

/// Product creation request. Price is decimal in the shop currency.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Partial product update; absent fields stay unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateStockEntryRequest {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub min_threshold: Option<u32>,
}

/// Signed stock adjustment (receiving, shrinkage, corrections)
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferStockRequest {
    pub product_id: Uuid,
    pub from_store_id: Uuid,
    pub to_store_id: Uuid,
    pub quantity: u32,
}

// =============================================================================
// Catalog management
// =============================================================================

/// Create a product
#[instrument(skip(state, identity, request), fields(sku = %request.sku))]
pub async fn create_product(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), HandlerError> {
    identity
        .require(Permission::ManageCatalog)
        .map_err(shop_error_to_response)?;

    let mut product = Product::new(
        request.sku,
        request.name,
        Price::new(request.price, Default::default()),
        request.category,
    );
    if let Some(desc) = request.description {
        product = product.with_description(desc);
    }
    if let Some(brand) = request.brand {
        product = product.with_brand(brand);
    }

    let created = product.clone();
    state
        .store
        .transaction(|data| data.add_product(product.clone()))
        .map_err(shop_error_to_response)?;

    info!(product_id = %created.id, "product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a product
#[instrument(skip(state, identity, request))]
pub async fn update_product(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, HandlerError> {
    identity
        .require(Permission::ManageCatalog)
        .map_err(shop_error_to_response)?;

    let updated = state
        .store
        .transaction(|data| {
            let product = data
                .product_mut(product_id)
                .ok_or(ShopError::ProductNotFound { product_id })?;

            if let Some(name) = &request.name {
                product.name = name.clone();
            }
            if let Some(price) = request.price {
                product.price = Price::new(price, product.price.currency);
            }
            if let Some(category) = &request.category {
                product.category = category.clone();
            }
            if let Some(description) = &request.description {
                product.description = description.clone();
            }
            if let Some(brand) = &request.brand {
                product.brand = brand.clone();
            }
            if let Some(active) = request.active {
                product.active = active;
            }
            product.updated_at = chrono::Utc::now();
            Ok(product.clone())
        })
        .map_err(shop_error_to_response)?;

    Ok(Json(updated))
}

/// Delete a product. Refused while order lines reference it.
#[instrument(skip(state, identity))]
pub async fn delete_product(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    identity
        .require(Permission::ManageCatalog)
        .map_err(shop_error_to_response)?;

    state
        .store
        .transaction(|data| data.remove_product(product_id))
        .map_err(shop_error_to_response)?;

    info!(%product_id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Create a store
#[instrument(skip(state, identity, request), fields(name = %request.name))]
pub async fn create_store(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>), HandlerError> {
    identity
        .require(Permission::ManageCatalog)
        .map_err(shop_error_to_response)?;

    let store = Store::new(request.name);
    let created = store.clone();
    state
        .store
        .transaction(|data| {
            data.add_store(store.clone());
            Ok(())
        })
        .map_err(shop_error_to_response)?;

    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
// Stock management
// =============================================================================

/// Create a stock entry for a (product, store) pair
#[instrument(skip(state, identity, request))]
pub async fn create_stock_entry(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<CreateStockEntryRequest>,
) -> Result<(StatusCode, Json<StockEntry>), HandlerError> {
    identity
        .require(Permission::ManageStock)
        .map_err(shop_error_to_response)?;

    let mut entry = StockEntry::new(request.product_id, request.store_id, request.quantity);
    if let Some(threshold) = request.min_threshold {
        entry = entry.with_min_threshold(threshold);
    }

    let created = entry.clone();
    state
        .store
        .transaction(|data| data.add_stock_entry(entry.clone()))
        .map_err(shop_error_to_response)?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Apply a signed delta to a stock entry
#[instrument(skip(state, identity, request))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<StockEntry>, HandlerError> {
    identity
        .require(Permission::ManageStock)
        .map_err(shop_error_to_response)?;

    let entry = state
        .store
        .adjust_stock(entry_id, request.delta)
        .map_err(shop_error_to_response)?;

    info!(%entry_id, delta = request.delta, quantity = entry.quantity, "stock adjusted");
    Ok(Json(entry))
}

/// Move stock between stores atomically
#[instrument(skip(state, identity, request))]
pub async fn transfer_stock(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Json(request): Json<TransferStockRequest>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    identity
        .require(Permission::ManageStock)
        .map_err(shop_error_to_response)?;

    state
        .store
        .transfer_stock(
            request.product_id,
            request.from_store_id,
            request.to_store_id,
            request.quantity,
        )
        .map_err(shop_error_to_response)?;

    let (from, to) = state.store.read(|data| {
        (
            data.entry_for(request.product_id, request.from_store_id).cloned(),
            data.entry_for(request.product_id, request.to_store_id).cloned(),
        )
    });

    Ok(Json(serde_json::json!({
        "from": from,
        "to": to
    })))
}

// =============================================================================
// Contact inbox
// =============================================================================

/// List received contact messages, newest last
pub async fn list_contact_messages(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> Result<Json<serde_json::Value>, HandlerError> {
    identity
        .require(Permission::ReadInbox)
        .map_err(shop_error_to_response)?;

    let messages = state.store.read(|data| data.messages.clone());
    let count = messages.len();
    Ok(Json(serde_json::json!({
        "messages": messages,
        "count": count
    })))
}
