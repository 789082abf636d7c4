//! Cache manager configuration via `txcache.toml`
//!
//! Selects which named caches get transaction-aware behavior. Caches not
//! selected are handed out undecorated and write straight through.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use txcache_core::{CacheError, CacheResult};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "txcache.toml";

/// Cache manager configuration loaded from `txcache.toml`.
///
/// # Example
///
/// ```toml
/// # Decorate every registered cache
/// all_transactional = false
///
/// # Or only these ones
/// transactional_caches = ["orders", "sessions"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TxCacheConfig {
    /// Decorate every cache, ignoring `transactional_caches`.
    #[serde(default)]
    pub all_transactional: bool,
    /// Names of the caches to decorate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactional_caches: Vec<String>,
}

impl TxCacheConfig {
    /// Configuration with no transactional cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration decorating every cache
    pub fn all() -> Self {
        Self {
            all_transactional: true,
            ..Self::default()
        }
    }

    /// Add a cache to decorate
    pub fn with_transactional_cache(mut self, name: impl Into<String>) -> Self {
        self.transactional_caches.push(name.into());
        self
    }

    /// Check if the named cache gets transaction-aware behavior
    pub fn is_transactional(&self, name: &str) -> bool {
        self.all_transactional || self.transactional_caches.iter().any(|n| n == name)
    }

    /// Validate cache names.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` for an empty or duplicated name.
    pub fn validate(&self) -> CacheResult<()> {
        let mut seen = HashSet::new();
        for name in &self.transactional_caches {
            if name.trim().is_empty() {
                return Err(CacheError::InvalidConfig(
                    "transactional_caches contains an empty cache name".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(CacheError::InvalidConfig(format!(
                    "cache '{}' listed twice in transactional_caches",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# txcache configuration
#
# Caches listed here defer put/evict/clear until the surrounding
# transaction commits, and discard them on rollback. Other caches
# write straight through.
all_transactional = false

# transactional_caches = ["orders", "sessions"]
"#
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` if the document cannot be parsed
    /// or fails validation.
    pub fn from_toml_str(content: &str) -> CacheResult<Self> {
        let config: TxCacheConfig = toml::from_str(content)
            .map_err(|e| CacheError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> CacheResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CacheError::InvalidConfig(msg) => {
                CacheError::InvalidConfig(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> CacheResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> CacheResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CacheError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
