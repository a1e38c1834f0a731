//! Level III product codes published per site.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Product codes per site, filled by the first successful listing.
#[derive(Debug, Default)]
pub struct ProductCache {
    products: RwLock<HashMap<String, Vec<String>>>,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, site: &str) -> Option<Vec<String>> {
        self.products.read().await.get(site).cloned()
    }

    pub async fn insert(&self, site: &str, mut products: Vec<String>) {
        products.sort();
        products.dedup();
        self.products.write().await.insert(site.to_string(), products);
    }

    pub async fn contains(&self, site: &str) -> bool {
        self.products.read().await.contains_key(site)
    }

    pub async fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self.products.read().await.keys().cloned().collect();
        sites.sort();
        sites
    }

    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_sorts_and_dedups() {
        let cache = ProductCache::new();
        assert!(!cache.contains("KLSX").await);

        cache
            .insert("KLSX", vec!["N0U".into(), "N0Q".into(), "N0U".into()])
            .await;
        assert_eq!(cache.get("KLSX").await, Some(vec!["N0Q".into(), "N0U".into()]));
        assert!(cache.get("KTLX").await.is_none());
    }

    #[tokio::test]
    async fn test_sites_and_clear() {
        let cache = ProductCache::new();
        cache.insert("KTLX", Vec::new()).await;
        cache.insert("KLSX", Vec::new()).await;
        assert_eq!(cache.sites().await, vec!["KLSX", "KTLX"]);

        cache.clear().await;
        assert!(cache.sites().await.is_empty());
    }
}
