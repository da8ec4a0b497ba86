//! # Forge-Cart RS
//!
//! E-commerce backend with MercadoPago checkout.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export MP_ACCESS_TOKEN=TEST-...
//! export MP_WEBHOOK_SECRET=...
//!
//! # Run the server
//! forge-cart
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    let (products, stores) = state.store.read(|d| (d.products.len(), d.stores.len()));
    info!("Catalog: {} products across {} stores", products, stores);

    let app = routes::create_router(state);

    info!("🛒 Forge-Cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Preference: POST http://{}/api/v1/checkout/preference", addr);
        info!("🔔 Webhook: POST http://{}/webhook/mercadopago", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Forge-Cart RS 🛒
  ━━━━━━━━━━━━━━━━━━━━
  E-commerce checkout engine
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
