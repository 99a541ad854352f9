//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::redirect::Policy;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::upstream::Upstream;

/// Type alias for the search-result cache, keyed by `(q, debug)`.
pub type SearchCache = Cache<String, Arc<peterbecom_core::SearchData>>;

/// Search cache capacity (number of distinct queries).
const SEARCH_CACHE_CAPACITY: u64 = 1_000;

/// Search cache TTL, matching the search page's `max-age`.
const SEARCH_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Retrying client for backend API calls.
    pub upstream: Upstream,

    /// Plain client for reverse-proxied requests. Redirects pass through to
    /// the client untouched.
    pub proxy_client: reqwest::Client,

    /// In-memory search result cache keyed by query.
    pub search_cache: SearchCache,

    /// Static file service for the public asset directory, used as the
    /// terminal fallback for unrouted GET paths.
    pub public_files: ServeDir,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let upstream = Upstream::new(&config)?;

        let proxy_client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;

        let search_cache = Cache::builder()
            .max_capacity(SEARCH_CACHE_CAPACITY)
            .time_to_live(SEARCH_CACHE_TTL)
            .build();

        let public_files = ServeDir::new(&config.public_dir).append_index_html_on_directories(false);

        tracing::info!(
            search_cache_capacity = SEARCH_CACHE_CAPACITY,
            search_cache_ttl_secs = SEARCH_CACHE_TTL.as_secs(),
            public_dir = %config.public_dir.display(),
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            upstream,
            proxy_client,
            search_cache,
            public_files,
        })
    }
}
