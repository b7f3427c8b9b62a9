/// Configuration management for blog-service
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present). Every value has a development default; production
/// refuses the defaults that would be unsafe there.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database URL that selects the in-memory store instead of PostgreSQL.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration for the JSON API
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session token configuration
    pub session: SessionConfig,
    /// Feed pagination configuration
    pub feed: FeedConfig,
    /// Query cache configuration
    pub cache: CacheConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// HTTP worker count
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL, or `memory://` for the in-memory store
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
}

/// Feed pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts per page when the client does not ask for a limit
    pub page_size: i64,
    /// Largest page a client may request
    pub max_page_size: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 15,
            max_page_size: 100,
        }
    }
}

/// Query cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries older than this are refetched; `None` keeps them until invalidated
    pub stale_after_secs: Option<u64>,
}

impl CacheConfig {
    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs)
    }
}

const DEV_SESSION_SECRET: &str = "dev-only-session-secret-change-me";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let feed = FeedConfig {
            page_size: parse_env_or_default("FEED_PAGE_SIZE", 15)?,
            max_page_size: parse_env_or_default("FEED_MAX_PAGE_SIZE", 100)?,
        };
        if feed.page_size < 1 || feed.page_size > feed.max_page_size {
            return Err(format!(
                "FEED_PAGE_SIZE must be within 1..={}, got {}",
                feed.max_page_size, feed.page_size
            ));
        }

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", 8080)?,
                workers: parse_env_or_default("BLOG_SERVICE_WORKERS", 4)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:8080".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/blog".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            session: {
                let secret = match std::env::var("SESSION_SECRET") {
                    Ok(value) if !value.trim().is_empty() => value,
                    _ if production => {
                        return Err("SESSION_SECRET must be set in production".to_string())
                    }
                    _ => DEV_SESSION_SECRET.to_string(),
                };

                SessionConfig {
                    secret,
                    ttl_secs: parse_env_or_default("SESSION_TTL_SECS", 60 * 60 * 24 * 30)?,
                    secure_cookie: parse_env_or_default("SESSION_SECURE_COOKIE", production)?,
                }
            },
            feed,
            cache: CacheConfig {
                stale_after_secs: match std::env::var("QUERY_CACHE_STALE_AFTER_SECS") {
                    Ok(value) => Some(value.parse().map_err(|e| {
                        format!("Failed to parse QUERY_CACHE_STALE_AFTER_SECS='{}': {}", value, e)
                    })?),
                    Err(_) => None,
                },
            },
        })
    }

    /// Configuration for tests and local runs against the in-memory store
    pub fn for_memory() -> Self {
        Config {
            app: AppConfig {
                env: "test".to_string(),
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: 1,
            },
            cors: CorsConfig {
                allowed_origins: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: MEMORY_DATABASE_URL.to_string(),
                max_connections: 1,
            },
            session: SessionConfig {
                secret: DEV_SESSION_SECRET.to_string(),
                ttl_secs: 3600,
                secure_cookie: false,
            },
            feed: FeedConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_config_selects_memory_store() {
        let config = Config::for_memory();
        assert!(config.database.is_memory());
        assert_eq!(config.feed.page_size, 15);
        assert!(config.cache.stale_after().is_none());
    }
}
