use crate::transport::CatalogTransport;
use crate::volume::{SearchResponse, Volume, VolumeInfo};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FALLBACK_TITLE: &str = "Book Information Temporarily Unavailable";
pub const FALLBACK_AUTHOR: &str = "Unknown Author";
pub const FALLBACK_DESCRIPTION: &str =
    "Sorry, we couldn't retrieve the book information at this time. Please try again later.";

/// Tuning knobs for the catalog gateway.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// How long a cached upstream payload stays readable.
    pub cache_ttl: Duration,
    /// Upper bound on entries per cache; least-recently-used entries are
    /// evicted beyond it.
    pub cache_capacity: u64,
    /// Maximum retries for a failed search.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every subsequent one.
    pub retry_base_delay: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 10_000,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Mediates every access to the external catalog behind a TTL cache, a
/// bounded retry policy and structurally complete degraded values.
///
/// Neither operation ever fails: searches degrade to an empty result and
/// single-volume lookups degrade to a fallback volume, so callers never
/// need a failure branch.
pub struct CatalogGateway {
    transport: Arc<dyn CatalogTransport>,
    search_cache: Cache<String, SearchResponse>,
    volume_cache: Cache<String, Volume>,
    config: CatalogConfig,
}

impl CatalogGateway {
    pub fn new(transport: Arc<dyn CatalogTransport>, config: CatalogConfig) -> Self {
        let search_cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();
        let volume_cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            transport,
            search_cache,
            volume_cache,
            config,
        }
    }

    pub fn with_defaults(transport: Arc<dyn CatalogTransport>) -> Self {
        Self::new(transport, CatalogConfig::default())
    }

    /// Search the catalog. Transient upstream failures (unavailable,
    /// timeout, no response) are retried with exponential backoff; any
    /// other failure, or exhausted retries, degrades to an empty result.
    /// Only successful responses are cached.
    pub async fn search(&self, query: &str, start_index: u32, max_results: u32) -> SearchResponse {
        let key = format!("search:{query}:{start_index}:{max_results}");
        if let Some(hit) = self.search_cache.get(&key).await {
            return hit;
        }

        let mut attempt = 0u32;
        loop {
            match self.transport.search(query, start_index, max_results).await {
                Ok(response) => {
                    self.search_cache.insert(key, response.clone()).await;
                    return response;
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.pow(attempt);
                    debug!("catalog search failed ({err}), retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!("catalog search for {query:?} degraded to empty result: {err}");
                    return SearchResponse::empty();
                }
            }
        }
    }

    /// Look up a single volume by its external identifier. Identifiers
    /// that don't match the catalog's shape short-circuit to a fallback
    /// volume without touching the network. Upstream failures are not
    /// retried: lookups fail fast to a fallback volume, which is never
    /// cached.
    pub async fn get_by_id(&self, volume_id: &str) -> Volume {
        if let Some(hit) = self.volume_cache.get(volume_id).await {
            return hit;
        }

        if !is_valid_volume_id(volume_id) {
            return fallback_volume(volume_id);
        }

        match self.transport.fetch_volume(volume_id).await {
            Ok(volume) => {
                self.volume_cache
                    .insert(volume_id.to_string(), volume.clone())
                    .await;
                volume
            }
            Err(err) => {
                warn!("catalog lookup for {volume_id} degraded to fallback: {err}");
                fallback_volume(volume_id)
            }
        }
    }
}

/// Identifier shape the upstream catalog assigns: 8-25 characters of
/// letters, digits, hyphen or underscore.
pub fn is_valid_volume_id(volume_id: &str) -> bool {
    (8..=25).contains(&volume_id.len())
        && volume_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Structurally complete stand-in for a volume that could not be
/// fetched. Same shape as a real payload, sentinel content, so
/// normalization never needs a failure branch.
pub fn fallback_volume(volume_id: &str) -> Volume {
    Volume {
        id: volume_id.to_string(),
        volume_info: Some(VolumeInfo {
            title: Some(FALLBACK_TITLE.to_string()),
            authors: Some(vec![FALLBACK_AUTHOR.to_string()]),
            description: Some(FALLBACK_DESCRIPTION.to_string()),
            ..VolumeInfo::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct ScriptedTransport {
        search_calls: AtomicUsize,
        volume_calls: AtomicUsize,
        search_script: Mutex<VecDeque<Result<SearchResponse, TransportError>>>,
        volume_script: Mutex<VecDeque<Result<Volume, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                search_calls: AtomicUsize::new(0),
                volume_calls: AtomicUsize::new(0),
                search_script: Mutex::new(VecDeque::new()),
                volume_script: Mutex::new(VecDeque::new()),
            }
        }

        fn push_search(&self, outcome: Result<SearchResponse, TransportError>) {
            self.search_script.lock().unwrap().push_back(outcome);
        }

        fn push_volume(&self, outcome: Result<Volume, TransportError>) {
            self.volume_script.lock().unwrap().push_back(outcome);
        }

        fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }

        fn volume_calls(&self) -> usize {
            self.volume_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CatalogTransport for ScriptedTransport {
        async fn search(
            &self,
            _query: &str,
            _start_index: u32,
            _max_results: u32,
        ) -> Result<SearchResponse, TransportError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.search_script
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted search outcome left")
        }

        async fn fetch_volume(&self, _volume_id: &str) -> Result<Volume, TransportError> {
            self.volume_calls.fetch_add(1, Ordering::SeqCst);
            self.volume_script
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted volume outcome left")
        }
    }

    fn sample_volume(id: &str, title: &str) -> Volume {
        Volume {
            id: id.to_string(),
            volume_info: Some(VolumeInfo {
                title: Some(title.to_string()),
                ..VolumeInfo::default()
            }),
        }
    }

    fn sample_response(total: i64) -> SearchResponse {
        SearchResponse {
            items: vec![sample_volume("abcd1234efgh", "Dune")],
            total_items: total,
        }
    }

    #[tokio::test]
    async fn test_invalid_id_short_circuits_without_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = CatalogGateway::with_defaults(transport.clone());

        for bad_id in ["short", "way-too-long-identifier-string", "has spaces!", ""] {
            let volume = gateway.get_by_id(bad_id).await;
            let info = volume.volume_info.unwrap();
            assert_eq!(info.title.as_deref(), Some(FALLBACK_TITLE));
            assert_eq!(info.description.as_deref(), Some(FALLBACK_DESCRIPTION));
        }

        assert_eq!(transport.volume_calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_and_is_not_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_volume(Err(TransportError::Status(500)));
        transport.push_volume(Ok(sample_volume("abcd1234efgh", "Dune")));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let first = gateway.get_by_id("abcd1234efgh").await;
        assert_eq!(
            first.volume_info.unwrap().title.as_deref(),
            Some(FALLBACK_TITLE)
        );

        // The fallback was not cached: the next call reaches upstream.
        let second = gateway.get_by_id("abcd1234efgh").await;
        assert_eq!(second.volume_info.unwrap().title.as_deref(), Some("Dune"));
        assert_eq!(transport.volume_calls(), 2);
    }

    #[tokio::test]
    async fn test_lookup_success_is_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_volume(Ok(sample_volume("abcd1234efgh", "Dune")));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let first = gateway.get_by_id("abcd1234efgh").await;
        let second = gateway.get_by_id("abcd1234efgh").await;

        assert_eq!(first.id, second.id);
        assert_eq!(transport.volume_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_retries_transient_failures_with_backoff() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Err(TransportError::Unavailable));
        transport.push_search(Err(TransportError::Unavailable));
        transport.push_search(Ok(sample_response(2)));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let started = Instant::now();
        let result = gateway.search("dune", 0, 10).await;
        let elapsed = started.elapsed();

        assert_eq!(result.total_items, 2);
        assert_eq!(transport.search_calls(), 3);
        // Two backoff waits: 1s then 2s.
        assert!(elapsed >= Duration::from_secs(3), "elapsed was {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed was {elapsed:?}");
    }

    #[tokio::test]
    async fn test_search_does_not_retry_permanent_failures() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Err(TransportError::Status(400)));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let result = gateway.search("dune", 0, 10).await;
        assert!(result.items.is_empty());
        assert_eq!(result.total_items, 0);
        assert_eq!(transport.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_exhausts_retries_then_degrades() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..4 {
            transport.push_search(Err(TransportError::TimedOut));
        }

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let started = Instant::now();
        let result = gateway.search("dune", 0, 10).await;
        let elapsed = started.elapsed();

        assert!(result.items.is_empty());
        assert_eq!(result.total_items, 0);
        // Initial attempt plus three retries.
        assert_eq!(transport.search_calls(), 4);
        // Backoff schedule 1s, 2s, 4s.
        assert!(elapsed >= Duration::from_secs(7), "elapsed was {elapsed:?}");
    }

    #[tokio::test]
    async fn test_identical_searches_within_ttl_cost_one_upstream_call() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Ok(sample_response(5)));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let first = gateway.search("dune", 0, 10).await;
        let second = gateway.search("dune", 0, 10).await;

        assert_eq!(first.total_items, second.total_items);
        assert_eq!(transport.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_different_pagination_is_a_different_cache_key() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Ok(sample_response(5)));
        transport.push_search(Ok(sample_response(5)));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        gateway.search("dune", 0, 10).await;
        gateway.search("dune", 10, 10).await;

        assert_eq!(transport.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_search_is_not_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Err(TransportError::Status(400)));
        transport.push_search(Ok(sample_response(1)));

        let gateway = CatalogGateway::with_defaults(transport.clone());

        let degraded = gateway.search("dune", 0, 10).await;
        assert!(degraded.items.is_empty());

        let recovered = gateway.search("dune", 0, 10).await;
        assert_eq!(recovered.total_items, 1);
        assert_eq!(transport.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_triggers_refetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_search(Ok(sample_response(1)));
        transport.push_search(Ok(sample_response(1)));

        let gateway = CatalogGateway::new(
            transport.clone(),
            CatalogConfig {
                cache_ttl: Duration::from_millis(100),
                ..CatalogConfig::default()
            },
        );

        gateway.search("dune", 0, 10).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        gateway.search("dune", 0, 10).await;

        assert_eq!(transport.search_calls(), 2);
    }

    #[test]
    fn test_volume_id_shape() {
        assert!(is_valid_volume_id("abcd1234"));
        assert!(is_valid_volume_id("zyTCalGZtrMC"));
        assert!(is_valid_volume_id("with-hyphen_08"));
        assert!(!is_valid_volume_id("short"));
        assert!(!is_valid_volume_id("abcdefghijklmnopqrstuvwxyz"));
        assert!(!is_valid_volume_id("has space"));
        assert!(!is_valid_volume_id("bang!bang!"));
        assert!(!is_valid_volume_id(""));
    }
}
