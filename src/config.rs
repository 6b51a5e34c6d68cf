use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog (TMDB) API key
    pub catalog_api_key: String,

    /// Catalog API base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// Timeout applied to every catalog request, in seconds
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Redis connection URL. Without one, state lives in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a computed recommendation stays fresh, in seconds
    #[serde(default = "default_recommendation_ttl_secs")]
    pub recommendation_ttl_secs: u64,

    /// Delay between rotation ticks, in milliseconds
    #[serde(default = "default_rotation_interval_ms")]
    pub rotation_interval_ms: u64,
}

fn default_catalog_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_ttl_secs() -> u64 {
    6 * 60 * 60
}

fn default_rotation_interval_ms() -> u64 {
    4500
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn recommendation_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.recommendation_ttl_secs as i64)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
