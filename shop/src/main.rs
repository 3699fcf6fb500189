//! Storefront demo: fetch the catalog, fill a cart, print the resulting state.
//!
//! ```text
//! cargo run -p storefront-shop --bin shop -- [PRODUCT_ID]
//! ```
//!
//! Configuration comes from the environment (see `ShopConfig`).

use storefront_runtime::metrics::MetricsServer;
use storefront_shop::{CartItem, ProductId, ShopConfig, ShopStore, UserAction};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop=info,storefront_shop=info,storefront_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ShopConfig::from_env()?;

    let mut metrics_server = config.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics_server.as_mut() {
        server.start()?;
    }

    let lookup_id = match std::env::args().nth(1) {
        Some(raw) => raw.parse::<ProductId>()?,
        None => ProductId::new(1),
    };

    let store = ShopStore::from_config(&config)?;

    // Catalog fetch
    let mut fetch = store.fetch_products().await?;
    fetch.wait_with_timeout(config.query_wait()).await?;

    let (products, error) = store
        .state(|s| (s.user.products.clone(), s.user.error.clone()))
        .await;
    if products.is_empty() {
        tracing::warn!(%error, "Catalog fetch returned nothing");
    } else {
        tracing::info!(count = products.len(), "Catalog loaded");
    }

    // Cart
    for product in products.iter().take(3) {
        store
            .send(UserAction::SetCartProducts(CartItem::new(product.clone())))
            .await?;
    }
    let lines = store.state(|s| s.user.cart_products.len()).await;
    store.send(UserAction::AddToCart(lines)).await?;

    if let Some(first) = products.first() {
        store.send(UserAction::Increment(first.id)).await?;
        store.send(UserAction::Increment(first.id)).await?;
    }
    if let Some(second) = products.get(1) {
        store.send(UserAction::Decrement(second.id)).await?;
    }

    // Cached queries
    match store.get_product(lookup_id).await {
        Ok(product) => tracing::info!(id = %product.id, title = %product.title, "Product lookup"),
        Err(error) => tracing::warn!(%error, "Product lookup failed"),
    }
    match store.get_all_products().await {
        Ok(all) => tracing::info!(count = all.len(), "Catalog query served"),
        Err(error) => tracing::warn!(%error, "Catalog query failed"),
    }

    let user = store.state(|s| s.user.clone()).await;
    println!("{}", serde_json::to_string_pretty(&user)?);
    println!(
        "cart: {} lines, {} items, total {:.2}",
        user.cart_products.len(),
        user.total_quantity(),
        user.total_price()
    );

    if let Some(rendered) = metrics_server.as_ref().and_then(MetricsServer::render) {
        tracing::debug!(bytes = rendered.len(), "Metrics snapshot rendered");
    }

    store.shutdown().await?;

    Ok(())
}
