//! Configuration management for Notescout

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub platform: PlatformConfig,
    pub discovery: DiscoveryConfig,
}

/// Where the signing gateway listens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5005".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base used for profile URLs and canonical post URLs
    pub web_base: String,
    /// Hosts whose links are share short links that must be expanded first
    pub short_link_hosts: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            web_base: "https://www.xiaohongshu.com".to_string(),
            short_link_hosts: vec!["xhslink.com".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Number of hits requested per keyword query during author discovery
    pub keyword_search_count: usize,
    /// Result count for free-text search when the caller gives none
    pub query_default_count: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            keyword_search_count: 200,
            query_default_count: 20,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when no file exists there.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
            None => resolve_config_path()?,
        };

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Profile URL for an internal user id
    pub fn profile_url(&self, internal_id: &str) -> String {
        format!(
            "{}/user/profile/{}",
            self.platform.web_base.trim_end_matches('/'),
            internal_id
        )
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("NOTESCOUT_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("notescout").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway.base_url, "http://127.0.0.1:5005");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.discovery.keyword_search_count, 200);
        assert_eq!(config.platform.short_link_hosts, vec!["xhslink.com"]);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[gateway]
base_url = "http://gateway.local:9000"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.gateway.base_url, "http://gateway.local:9000");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.platform.web_base, "https://www.xiaohongshu.com");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nbase_url = ").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        let config = Config::load_or_default(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.discovery.query_default_count, 20);
    }

    #[test]
    fn test_profile_url() {
        let mut config = Config::default();
        assert_eq!(
            config.profile_url("5f1a"),
            "https://www.xiaohongshu.com/user/profile/5f1a"
        );

        config.platform.web_base = "https://example.test/".to_string();
        assert_eq!(config.profile_url("u1"), "https://example.test/user/profile/u1");
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        std::env::set_var("NOTESCOUT_CONFIG", "/tmp/notescout-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("NOTESCOUT_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/notescout-test/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_uses_env_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[discovery]\nkeyword_search_count = 50\n").unwrap();

        std::env::set_var("NOTESCOUT_CONFIG", path.to_str().unwrap());
        let config = Config::load();
        std::env::remove_var("NOTESCOUT_CONFIG");

        assert_eq!(config.unwrap().discovery.keyword_search_count, 50);
    }
}
