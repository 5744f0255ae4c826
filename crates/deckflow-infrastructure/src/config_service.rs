//! Engine configuration service.
//!
//! Loads the engine configuration from a TOML file, validates it, and
//! caches it to avoid repeated file I/O. A missing file is populated with
//! the defaults so operators always have a complete file to edit.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use deckflow_core::Result;
use deckflow_core::config::EngineConfig;

use crate::storage::write_atomic;

/// Cached, invalidatable access to the engine configuration file.
pub struct EngineConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    cache: RwLock<Option<EngineConfig>>,
}

impl EngineConfigService {
    /// Creates a service reading from `path`. Nothing is loaded until the
    /// first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Returns the engine configuration, loading and validating it on
    /// first access.
    pub fn load(&self) -> Result<EngineConfig> {
        {
            let cached = self.cache.read().unwrap();
            if let Some(ref config) = *cached {
                return Ok(config.clone());
            }
        }

        let loaded = self.read_or_create()?;
        loaded.validate()?;

        let mut cached = self.cache.write().unwrap();
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drops the cached configuration, forcing a reload on next access.
    pub fn invalidate(&self) {
        let mut cached = self.cache.write().unwrap();
        *cached = None;
    }

    fn read_or_create(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            let config = EngineConfig::default();
            write_atomic(&self.path, &toml::to_string_pretty(&config)?)?;
            tracing::info!(
                target: "config",
                "No engine config at {:?}, wrote the defaults",
                self.path
            );
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        let service = EngineConfigService::new(&path);

        let config = service.load().unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn values_and_per_service_overrides_are_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        fs::write(
            &path,
            r#"
rollout_percentage = 25
max_concurrency = 8

[service_base_urls]
chart = "http://charts.internal:8103"

[router.default]
timeout_ms = 10000

[router.services.chart]
timeout_ms = 45000
max_retries = 6
"#,
        )
        .unwrap();

        let config = EngineConfigService::new(&path).load().unwrap();
        assert_eq!(config.rollout_percentage, 25);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(
            config.service_base_urls.get("chart").map(String::as_str),
            Some("http://charts.internal:8103")
        );
        assert_eq!(config.router.policy_for("chart").timeout_ms, 45_000);
        assert_eq!(config.router.policy_for("chart").max_retries, 6);
        // Services without an override get the default policy.
        assert_eq!(config.router.policy_for("layout").timeout_ms, 10_000);
    }

    #[test]
    fn invalid_configuration_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        fs::write(&path, "rollout_percentage = 150\n").unwrap();

        let err = EngineConfigService::new(&path).load().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn loads_are_cached_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");
        fs::write(&path, "rollout_percentage = 10\n").unwrap();
        let service = EngineConfigService::new(&path);

        assert_eq!(service.load().unwrap().rollout_percentage, 10);

        // A change on disk is invisible while the cache holds.
        fs::write(&path, "rollout_percentage = 60\n").unwrap();
        assert_eq!(service.load().unwrap().rollout_percentage, 10);

        service.invalidate();
        assert_eq!(service.load().unwrap().rollout_percentage, 60);
    }
}
