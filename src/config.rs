use std::env;
use std::path::PathBuf;

/// Retry policy for catalog fetches
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub attempts: u32,
    /// Base delay before the first retry; doubles on each subsequent retry
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Backend base URL, e.g. https://api.example.com/api
    pub api_url: String,

    // HTTP client timeout configuration (in seconds)
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,

    // Bounded retry for catalog fetches
    pub catalog_retry: RetryConfig,

    // Override for the persisted session file (None = per-user default)
    pub session_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables using std::env::var
    pub fn load() -> anyhow::Result<Self> {
        // Required variables
        let api_url = env::var("PORTAL_API_URL")
            .map_err(|_| anyhow::anyhow!("PORTAL_API_URL environment variable is required"))?;

        // Normalize by trimming trailing slashes to prevent double-slash issues
        // e.g., "https://api.example.com/api/" -> "https://api.example.com/api"
        let api_url = api_url.trim_end_matches('/').to_string();

        // Optional variables with defaults
        let http_connect_timeout_secs = env::var("HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let http_request_timeout_secs = env::var("HTTP_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let retry_attempts = env::var("CATALOG_RETRY_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_base_delay_ms = env::var("CATALOG_RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(250);

        // Session file override: if not set or empty, use the per-user default
        let session_file = env::var("PORTAL_SESSION_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            api_url,
            http_connect_timeout_secs,
            http_request_timeout_secs,
            catalog_retry: RetryConfig {
                attempts: retry_attempts,
                base_delay_ms: retry_base_delay_ms,
            },
            session_file,
        })
    }
}
