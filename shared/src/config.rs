//! Configuration management for the scraper

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cache: CacheConfig,
    pub browser: BrowserConfig,
    pub http: HttpConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub keystroke_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub navigation_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub retries: u32,
    pub min_backoff_ms: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            cache: CacheConfig {
                file: env::var("CACHE_FILE")
                    .unwrap_or_else(|_| "./cache.json".to_string())
                    .into(),
            },
            browser: BrowserConfig {
                webdriver_url: env::var("WEBDRIVER_URL")
                    .unwrap_or_else(|_| "http://localhost:4444".to_string()),
                headless: env::var("BROWSER_HEADLESS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                keystroke_delay_ms: env::var("KEYBOARD_TYPE_DELAY_MS")
                    .unwrap_or_else(|_| "250".to_string())
                    .parse()?,
                settle_delay_ms: env::var("TIME_BETWEEN_REQUESTS_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                navigation_timeout_seconds: env::var("NAVIGATION_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
            http: HttpConfig {
                retries: env::var("SCRAPER_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                min_backoff_ms: env::var("SCRAPER_MIN_BACKOFF_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                request_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
            app: AppConfig {
                environment: env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                file: PathBuf::from("./cache.json"),
            },
            browser: BrowserConfig {
                webdriver_url: "http://localhost:4444".to_string(),
                headless: true,
                keystroke_delay_ms: 250,
                settle_delay_ms: 1000,
                navigation_timeout_seconds: 30,
            },
            http: HttpConfig {
                retries: 3,
                min_backoff_ms: 1000,
                request_timeout_seconds: 30,
            },
            app: AppConfig {
                environment: "development".to_string(),
                log_level: "info".to_string(),
            },
        }
    }
}
