//! # Application State
//!
//! Shared state for the Axum application: the shop store, the checkout
//! service with its injected gateway, and server configuration.

use serde::Deserialize;
use shop_core::{
    BoxedPaymentGateway, CheckoutService, Price, Product, ShopData, ShopStore, StockEntry, Store,
};
use shop_mercadopago::{MercadoPagoConfig, MercadoPagoGateway};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Shop data store
    pub store: ShopStore,
    /// Checkout orchestrator
    pub checkout: Arc<CheckoutService>,
    /// Webhook signing secret (verification skipped when absent)
    pub webhook_secret: Option<String>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state with the production MercadoPago gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let mp_config = MercadoPagoConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize MercadoPago: {}", e))?;
        let webhook_secret = mp_config.webhook_secret.clone();
        let gateway: BoxedPaymentGateway = Arc::new(MercadoPagoGateway::new(mp_config));

        let store = ShopStore::with_data(load_seed_data()?);

        Ok(Self {
            checkout: Arc::new(CheckoutService::new(store.clone(), gateway)),
            store,
            webhook_secret,
            config,
        })
    }

    /// Create state over an arbitrary gateway (tests)
    pub fn with_gateway(store: ShopStore, gateway: BoxedPaymentGateway) -> Self {
        Self {
            checkout: Arc::new(CheckoutService::new(store.clone(), gateway)),
            store,
            webhook_secret: None,
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost".to_string(),
                environment: "test".to_string(),
            },
        }
    }
}

// =============================================================================
// Seed data
// =============================================================================

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    products: Vec<SeedProduct>,
    #[serde(default)]
    stores: Vec<SeedStore>,
    #[serde(default)]
    stock: Vec<SeedStock>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    sku: String,
    name: String,
    price: f64,
    category: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedStore {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedStock {
    sku: String,
    store: String,
    quantity: u32,
    #[serde(default)]
    min_threshold: Option<u32>,
}

/// Load seed catalog/stores/stock from config/seed.toml.
///
/// Stock rows reference products by SKU and stores by name, so the
/// file stays writable by hand without UUIDs.
fn load_seed_data() -> anyhow::Result<ShopData> {
    let config_paths = [
        "config/seed.toml",
        "../config/seed.toml",
        "../../config/seed.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let seed: SeedFile = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            let data = build_seed(seed)?;
            tracing::info!(
                "Seeded {} products, {} stores, {} stock entries from {}",
                data.products.len(),
                data.stores.len(),
                data.stock.len(),
                path
            );
            return Ok(data);
        }
    }

    tracing::warn!("No seed file found, starting with an empty shop");
    Ok(ShopData::default())
}

fn build_seed(seed: SeedFile) -> anyhow::Result<ShopData> {
    let mut data = ShopData::default();

    for p in seed.products {
        let mut product = Product::new(p.sku, p.name, Price::new(p.price, Default::default()), p.category);
        if let Some(desc) = p.description {
            product = product.with_description(desc);
        }
        if let Some(brand) = p.brand {
            product = product.with_brand(brand);
        }
        data.add_product(product)
            .map_err(|e| anyhow::anyhow!("Invalid seed product: {}", e))?;
    }

    for s in seed.stores {
        data.add_store(Store::new(s.name));
    }

    for s in seed.stock {
        let product_id = data
            .product_by_sku(&s.sku)
            .map(|p| p.id)
            .ok_or_else(|| anyhow::anyhow!("Seed stock references unknown SKU: {}", s.sku))?;
        let store_id = data
            .stores
            .iter()
            .find(|st| st.name == s.store)
            .map(|st| st.id)
            .ok_or_else(|| anyhow::anyhow!("Seed stock references unknown store: {}", s.store))?;

        let mut entry = StockEntry::new(product_id, store_id, s.quantity);
        if let Some(threshold) = s.min_threshold {
            entry = entry.with_min_threshold(threshold);
        }
        data.add_stock_entry(entry)
            .map_err(|e| anyhow::anyhow!("Invalid seed stock entry: {}", e))?;
    }

    Ok(data)
}
