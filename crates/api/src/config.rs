//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use domain::{MIB, UploadLimits};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` bind address (default: `"0.0.0.0"`)
/// - `PORT` listen port (default: `3000`)
/// - `RUST_LOG` tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` PostgreSQL connection string (unset: in-memory store)
/// - `DEFAULT_PHOTO_PATH` placeholder image (default: `"assets/default.jpg"`)
/// - `UPLOAD_DIR` where uploads are spooled (default: system temp dir)
/// - `MAX_FILE_BYTES` per-file cap while parsing (default: 2 MiB)
/// - `MAX_IMAGE_BYTES` cap on a stored image (default: 1 MiB)
/// - `API_TOKENS` `token=user_uuid:name` grants separated by commas
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub default_photo_path: PathBuf,
    pub upload_dir: Option<PathBuf>,
    pub max_file_bytes: u64,
    pub max_image_bytes: u64,
    pub api_tokens: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty("DATABASE_URL"),
            default_photo_path: non_empty("DEFAULT_PHOTO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.default_photo_path),
            upload_dir: non_empty("UPLOAD_DIR").map(PathBuf::from),
            max_file_bytes: non_empty("MAX_FILE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_file_bytes),
            max_image_bytes: non_empty("MAX_IMAGE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_bytes),
            api_tokens: non_empty("API_TOKENS").unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_bytes: self.max_file_bytes,
            max_image_bytes: self.max_image_bytes,
        }
    }

    /// Raw request body limit: twice the file cap, so the parser's own cap
    /// trips before the transport limit does.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_bytes.saturating_mul(2)).unwrap_or(usize::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            default_photo_path: PathBuf::from("assets/default.jpg"),
            upload_dir: None,
            max_file_bytes: 2 * MIB,
            max_image_bytes: MIB,
            api_tokens: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_photo_path, PathBuf::from("assets/default.jpg"));
        assert_eq!(config.max_file_bytes, 2 * 1024 * 1024);
        assert_eq!(config.max_image_bytes, 1024 * 1024);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = from_map(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://localhost/shops"),
            ("UPLOAD_DIR", "/var/spool/shops"),
            ("MAX_IMAGE_BYTES", "512"),
            ("API_TOKENS", "t=abc:Ada"),
        ]);
        assert_eq!(config.port, 8081);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shops"));
        assert_eq!(config.upload_dir, Some(PathBuf::from("/var/spool/shops")));
        assert_eq!(config.limits().max_image_bytes, 512);
        assert_eq!(config.limits().max_file_bytes, 2 * MIB);
        assert_eq!(config.api_tokens, "t=abc:Ada");
    }

    #[test]
    fn test_unparseable_and_blank_values_fall_back() {
        let config = from_map(&[("PORT", "http"), ("MAX_FILE_BYTES", "lots"), ("HOST", " ")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_file_bytes, 2 * MIB);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_body_limit_exceeds_file_cap() {
        let config = Config::default();
        assert_eq!(config.body_limit(), 4 * 1024 * 1024);
    }
}
