use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where a served model catalog came from, in decreasing freshness order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCatalogSource {
    ProviderApi,
    CacheFresh,
    CacheStaleFallback,
    StaticFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub models: Vec<Model>,
    pub source: ModelCatalogSource,
    pub warning: Option<String>,
}

impl ModelCatalog {
    pub fn from_provider_api(models: Vec<Model>) -> Self {
        Self {
            models,
            source: ModelCatalogSource::ProviderApi,
            warning: None,
        }
    }

    pub fn from_cache_fresh(models: Vec<Model>) -> Self {
        Self {
            models,
            source: ModelCatalogSource::CacheFresh,
            warning: None,
        }
    }

    pub fn from_cache_stale(models: Vec<Model>, warning: String) -> Self {
        Self {
            models,
            source: ModelCatalogSource::CacheStaleFallback,
            warning: Some(warning),
        }
    }

    pub fn from_static_fallback(models: Vec<Model>, warning: String) -> Self {
        Self {
            models,
            source: ModelCatalogSource::StaticFallback,
            warning: Some(warning),
        }
    }
}

struct CacheEntry {
    models: Vec<Model>,
    fetched_at: Instant,
}

/// TTL cache for per-provider model listings.
pub struct ModelCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ModelCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }

    pub async fn get_fresh(&self, provider_id: &str) -> Option<Vec<Model>> {
        let entries = self.entries.read().await;
        entries.get(provider_id).and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some(entry.models.clone())
            } else {
                None
            }
        })
    }

    pub async fn get_any(&self, provider_id: &str) -> Option<Vec<Model>> {
        let entries = self.entries.read().await;
        entries.get(provider_id).map(|entry| entry.models.clone())
    }

    pub async fn set(&self, provider_id: &str, models: Vec<Model>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            provider_id.to_string(),
            CacheEntry {
                models,
                fetched_at: Instant::now(),
            },
        );
    }
}

static MODEL_CACHE: OnceLock<Arc<ModelCache>> = OnceLock::new();

pub fn get_model_cache() -> Arc<ModelCache> {
    MODEL_CACHE
        .get_or_init(|| Arc::new(ModelCache::with_default_ttl()))
        .clone()
}

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

pub fn default_openai_models() -> Vec<Model> {
    vec![
        Model::from_id("gpt-4o-mini").with_description("Fast default for edit suggestions"),
        Model::from_id("gpt-4o").with_description("High quality general model"),
        Model::from_id("gpt-4.1").with_description("Long-context model for full-project prompts"),
        Model::from_id("o3").with_description("Advanced reasoning model"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_entries_expire_after_ttl() {
        let cache = ModelCache::new(Duration::ZERO);
        cache
            .set("openai", vec![Model::from_id("gpt-4o-mini")])
            .await;

        // With a zero TTL the entry is immediately stale for get_fresh but
        // still reachable through get_any.
        assert!(cache.get_fresh("openai").await.is_none());
        assert_eq!(
            cache.get_any("openai").await.map(|models| models.len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn cache_is_scoped_per_provider() {
        let cache = ModelCache::with_default_ttl();
        cache.set("openai", default_openai_models()).await;

        assert!(cache.get_fresh("openai").await.is_some());
        assert!(cache.get_any("another-provider").await.is_none());
    }
}
