/// Configuration management for yatube-service
///
/// Everything is read from environment variables; a `.env` file is loaded
/// by `main` before this runs.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration; absent means the in-memory store
    pub database: Option<DatabaseConfig>,
    /// Logging configuration
    pub log: LogConfig,
    /// Optional fixture file with users and groups to seed at startup
    pub fixtures_path: Option<String>,
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
    /// Actix worker threads
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
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("YATUBE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("YATUBE_PORT", 8000)?,
                workers: parse_env_or_default("YATUBE_WORKERS", 4)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: match std::env::var("DATABASE_URL") {
                Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                    url,
                    max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                }),
                _ => None,
            },
            log: LogConfig {
                filter: std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "info,actix_web=info".to_string()),
                format: match std::env::var("LOG_FORMAT") {
                    Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                    Ok(v) if v.is_empty() || v.eq_ignore_ascii_case("text") => LogFormat::Text,
                    Ok(v) => return Err(format!("LOG_FORMAT must be 'text' or 'json', got '{}'", v)),
                    Err(_) => LogFormat::Text,
                },
            },
            fixtures_path: std::env::var("YATUBE_FIXTURES")
                .ok()
                .filter(|p| !p.trim().is_empty()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
