//! Product catalog lookup used when pricing order lines.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::order::{Money, ProductId};

/// A product as found in the catalog at order time.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
}

/// Resolves product references against the catalog.
///
/// Order placement snapshots the listing's name and price into the order
/// line, so later catalog edits never rewrite history.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn resolve(&self, product_id: &ProductId) -> Option<ProductListing>;
}

/// In-memory catalog for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    listings: Arc<RwLock<HashMap<ProductId, ProductListing>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, listing: ProductListing) {
        let mut listings = self.listings.write().await;
        listings.insert(listing.product_id.clone(), listing);
    }

    pub async fn remove(&self, product_id: &ProductId) {
        let mut listings = self.listings.write().await;
        listings.remove(product_id);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn resolve(&self, product_id: &ProductId) -> Option<ProductListing> {
        let listings = self.listings.read().await;
        listings.get(product_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_inserted_listing() {
        let catalog = InMemoryProductCatalog::new();
        let product_id = ProductId::new("tomatoes-1kg");
        catalog
            .insert(ProductListing {
                product_id: product_id.clone(),
                name: "Tomatoes 1kg".to_string(),
                unit_price: Money::from_cents(450),
            })
            .await;

        let listing = catalog.resolve(&product_id).await.unwrap();
        assert_eq!(listing.name, "Tomatoes 1kg");
        assert_eq!(listing.unit_price, Money::from_cents(450));
    }

    #[tokio::test]
    async fn unknown_product_resolves_to_none() {
        let catalog = InMemoryProductCatalog::new();
        assert!(catalog.resolve(&ProductId::new("missing")).await.is_none());
    }
}
