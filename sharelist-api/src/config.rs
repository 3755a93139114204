/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3001)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `STORAGE_BACKEND`: `file` or `memory` (default: file)
/// - `DATA_DIR`: Root of the file store (default: ./data)
/// - `MAX_WRITE_ATTEMPTS`: Retries for conflicting list writes (default: 3)
/// - `LIST_READ_POLICY`: `open` or `members` (default: open)
/// - `RUST_LOG`: Log filter
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use sharelist_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sharelist_shared::auth::access::ReadPolicy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Access policy configuration
    pub access: AccessConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HTTPS in front, HSTS on)
    pub production: bool,
}

/// Where list and user documents live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND must be 'file' or 'memory', got '{}'", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Root directory of the file store
    pub data_dir: PathBuf,

    /// How many times a list write is attempted when it races another
    pub max_write_attempts: u32,
}

/// Access policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Whether identity-bearing non-members may read lists
    pub read_policy: ReadPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                data_dir: PathBuf::from("./data"),
                max_write_attempts: 3,
            },
            access: AccessConfig {
                read_policy: ReadPolicy::Open,
            },
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("API_HOST").unwrap_or(defaults.api.host);

        let port = match lookup("API_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("API_PORT must be a port number: {}", e))?,
            None => defaults.api.port,
        };

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.api.cors_origins,
        };

        let production = match lookup("API_PRODUCTION") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow::anyhow!("API_PRODUCTION must be true or false"))?,
            None => defaults.api.production,
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.storage.backend,
        };

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_dir);

        let max_write_attempts = match lookup("MAX_WRITE_ATTEMPTS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("MAX_WRITE_ATTEMPTS must be a number: {}", e))?,
            None => defaults.storage.max_write_attempts,
        };

        if max_write_attempts == 0 {
            anyhow::bail!("MAX_WRITE_ATTEMPTS must be at least 1");
        }

        let read_policy = match lookup("LIST_READ_POLICY") {
            Some(raw) => raw.parse::<ReadPolicy>().map_err(anyhow::Error::msg)?,
            None => defaults.access.read_policy,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            storage: StorageConfig {
                backend,
                data_dir,
                max_write_attempts,
            },
            access: AccessConfig { read_policy },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_bind_address() {
        let mut config = Config::default();
        config.api.host = "127.0.0.1".to_string();
        config.api.port = 8080;

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.api.port, 3001);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.max_write_attempts, 3);
        assert_eq!(config.access.read_policy, ReadPolicy::Open);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("API_PRODUCTION", "yes"),
            ("STORAGE_BACKEND", "Memory"),
            ("DATA_DIR", "/var/lib/sharelist"),
            ("MAX_WRITE_ATTEMPTS", "5"),
            ("LIST_READ_POLICY", "members"),
        ]))
        .unwrap();

        assert_eq!(config.api.port, 9000);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.api.production);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/sharelist"));
        assert_eq!(config.storage.max_write_attempts, 5);
        assert_eq!(config.access.read_policy, ReadPolicy::Members);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("API_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("STORAGE_BACKEND", "postgres")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("MAX_WRITE_ATTEMPTS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("LIST_READ_POLICY", "strict")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("API_PRODUCTION", "maybe")])).is_err());
    }
}
