//! Application configuration loaded from environment variables.

use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,

    /// Origin of the content backend API (e.g. "http://127.0.0.1:8000").
    pub api_base: String,

    /// Public base URL of the site, used for canonical links.
    pub base_url: String,

    /// Directory of static public assets. Build assets live in
    /// `{public_dir}/build`, images in `{public_dir}/images`.
    pub public_dir: PathBuf,

    /// Compress page and proxy responses (br/gzip). Off by default since a
    /// CDN usually does this better.
    pub use_compression: bool,

    /// Maximum attempts for upstream GET calls. Development deployments set
    /// this to 1.
    pub upstream_retries: u32,

    /// Google Analytics measurement ID, injected into page chrome when set.
    pub ga_tracking_id: Option<String>,

    /// Rollbar access token for error reporting. Reporting is disabled when
    /// unset.
    pub rollbar_access_token: Option<String>,

    /// Seconds of idle time before the client-side screensaver starts.
    /// Forwarded to the page chrome as a script config value.
    pub screensaver_lazy_start_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `PORT`: listen port (default: 3000)
    /// - `API_BASE`: backend origin (default: "http://127.0.0.1:8000")
    /// - `BASE_URL`: canonical site origin (default: "https://www.peterbe.com")
    /// - `PUBLIC_DIR`: static asset directory (default: "public")
    /// - `USE_COMPRESSION`: "true"/"1" to enable response compression
    /// - `UPSTREAM_RETRIES`: max upstream GET attempts (default: 4)
    /// - `GA_TRACKING_ID`: Google Analytics measurement ID
    /// - `ROLLBAR_ACCESS_TOKEN`: error reporting token
    /// - `SCREENSAVER_LAZY_START_SECONDS`: client screensaver idle delay
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {raw:?}"))?,
            Err(_) => 3000,
        };

        let api_base = std::env::var("API_BASE")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| "https://www.peterbe.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let public_dir =
            PathBuf::from(std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()));

        let use_compression = std::env::var("USE_COMPRESSION")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "True" | "TRUE"))
            .unwrap_or(false);

        let upstream_retries: u32 = match std::env::var("UPSTREAM_RETRIES") {
            Ok(raw) => raw
                .parse()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| anyhow::anyhow!("UPSTREAM_RETRIES must be a positive integer"))?,
            Err(_) => 4,
        };

        let ga_tracking_id = non_empty_var("GA_TRACKING_ID");
        let rollbar_access_token = non_empty_var("ROLLBAR_ACCESS_TOKEN");

        let screensaver_lazy_start_seconds = non_empty_var("SCREENSAVER_LAZY_START_SECONDS")
            .map(|raw| {
                raw.parse().map_err(|_| {
                    anyhow::anyhow!("SCREENSAVER_LAZY_START_SECONDS is not a number: {raw:?}")
                })
            })
            .transpose()?;

        tracing::info!(
            port = port,
            api_base = %api_base,
            base_url = %base_url,
            public_dir = %public_dir.display(),
            use_compression = use_compression,
            upstream_retries = upstream_retries,
            error_reporting = rollbar_access_token.is_some(),
            "edge configuration loaded"
        );

        Ok(Self {
            port,
            api_base,
            base_url,
            public_dir,
            use_compression,
            upstream_retries,
            ga_tracking_id,
            rollbar_access_token,
            screensaver_lazy_start_seconds,
        })
    }
}

/// Read an environment variable, treating empty values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|raw| !raw.trim().is_empty())
}
