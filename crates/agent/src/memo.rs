use std::sync::Arc;

use shopchat_core::config::CacheConfig;
use shopchat_core::errors::CollaboratorError;
use shopchat_core::memo::cache_key;
use shopchat_core::ports::ResponseCache;
use tracing::{debug, warn};

/// Best-effort memo of validated replies, keyed by the assembled prompt. Backend failures read
/// as misses and writes that fail are dropped.
pub struct Memoizer {
    cache: Option<Arc<dyn ResponseCache>>,
    ttl_secs: u64,
}

impl Memoizer {
    pub fn new(cache: Option<Arc<dyn ResponseCache>>, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }

    pub fn from_config(cache: Option<Arc<dyn ResponseCache>>, config: &CacheConfig) -> Self {
        Self::new(cache.filter(|_| config.enabled), config.ttl_secs)
    }

    pub fn disabled() -> Self {
        Self::new(None, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn lookup(&self, prompt: &str, correlation_id: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let key = cache_key(prompt);
        match cache.get(&key).await {
            Ok(Some(value)) => {
                debug!(
                    event_name = "chat.memo.hit",
                    correlation_id = %correlation_id,
                    cache_key = %key,
                    "memoized reply reused"
                );
                Some(value)
            }
            Ok(None) => None,
            Err(failure) => {
                log_unavailable(&failure, "read", correlation_id);
                None
            }
        }
    }

    pub async fn store(&self, prompt: &str, reply: &str, correlation_id: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(failure) = cache.set(&cache_key(prompt), reply, self.ttl_secs).await {
            log_unavailable(&failure, "write", correlation_id);
        }
    }
}

fn log_unavailable(failure: &CollaboratorError, operation: &'static str, correlation_id: &str) {
    warn!(
        event_name = "chat.memo.unavailable",
        correlation_id = %correlation_id,
        operation,
        reason_code = failure.reason_code(),
        error = %failure,
        "response cache unavailable; continuing without memo"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shopchat_core::config::CacheConfig;
    use shopchat_db::InMemoryResponseCache;

    use super::Memoizer;

    #[tokio::test]
    async fn stored_reply_is_found_under_normalized_prompt() {
        let cache = Arc::new(InMemoryResponseCache::default());
        let memo = Memoizer::new(Some(cache.clone()), 60);

        memo.store("Áo thun   giá?", "Dạ 150.000đ ạ", "req-1").await;
        assert_eq!(memo.lookup("áo thun giá", "req-2").await, Some("Dạ 150.000đ ạ".to_string()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_miss() {
        let cache = Arc::new(InMemoryResponseCache::default());
        let memo = Memoizer::new(Some(cache.clone()), 60);
        cache.set_failing(true);

        memo.store("prompt", "reply", "req-3").await;
        assert_eq!(memo.lookup("prompt", "req-3").await, None);
    }

    #[tokio::test]
    async fn disabled_config_never_touches_the_cache() {
        let cache = Arc::new(InMemoryResponseCache::default());
        let memo = Memoizer::from_config(
            Some(cache.clone()),
            &CacheConfig { enabled: false, ttl_secs: 60 },
        );

        memo.store("prompt", "reply", "req-4").await;
        assert!(!memo.is_enabled());
        assert!(cache.is_empty().await);
    }
}
