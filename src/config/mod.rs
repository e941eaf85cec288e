//! Configuration module for the ToolHub backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the identity provider's REST API
    pub auth_api_url: String,
    /// API key passed to the identity provider
    pub auth_api_key: String,
    /// Base URL of the blob store
    pub blob_store_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("TOOLHUB_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("TOOLHUB_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TOOLHUB_BIND_ADDR format");

        let log_level = env::var("TOOLHUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let auth_api_url = env::var("TOOLHUB_AUTH_API_URL")
            .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string());

        let auth_api_key = env::var("TOOLHUB_AUTH_API_KEY").unwrap_or_default();

        let blob_store_url = env::var("TOOLHUB_BLOB_STORE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9199/toolhub".to_string());

        Self {
            db_path,
            bind_addr,
            log_level,
            auth_api_url,
            auth_api_key,
            blob_store_url,
        }
    }
}
