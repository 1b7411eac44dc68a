//! Configuration loading and layering
//!
//! Precedence order (highest to lowest):
//! 1. Environment variable overrides
//! 2. Root config file
//! 3. Built-in defaults

use super::{paths, schema::Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers applied
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::root_config_path())
    }

    /// Load configuration using `path` as the root config file
    ///
    /// A missing file leaves the defaults in place; an unreadable or
    /// unparsable one is reported and skipped.
    pub fn load_from(path: &Path) -> Result<Config> {
        let mut config = Config::default();

        if path.exists() {
            match Self::load_file(path) {
                Ok(file_config) => config = file_config,
                Err(e) => tracing::warn!("Ignoring config file {}: {:#}", path.display(), e),
            }
        }

        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Check the root config file parses and the merged result is consistent
    pub fn validate_root() -> Result<Config> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            Self::load_file(&root_path)?;
        }
        let config = Self::load().context("Failed to load merged configuration")?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Check the relations between configured budgets
    ///
    /// Fallback requests must be strictly smaller and strictly faster than
    /// the requests they replace.
    pub fn validate(config: &Config) -> Result<()> {
        let retrieval = &config.retrieval;
        if retrieval.timeout_seconds == 0 || config.crd.timeout_seconds == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }
        if retrieval.fallback_timeout_seconds >= retrieval.timeout_seconds {
            anyhow::bail!(
                "retrieval.fallbackTimeoutSeconds ({}) must be less than retrieval.timeoutSeconds ({})",
                retrieval.fallback_timeout_seconds,
                retrieval.timeout_seconds
            );
        }
        if retrieval.max_nodes == 0 {
            anyhow::bail!("retrieval.maxNodes must be at least 1");
        }
        if retrieval.fallback_max_nodes == 0 || retrieval.fallback_max_nodes >= retrieval.max_nodes
        {
            anyhow::bail!(
                "retrieval.fallbackMaxNodes ({}) must be between 1 and retrieval.maxNodes ({})",
                retrieval.fallback_max_nodes,
                retrieval.max_nodes
            );
        }

        let crd = &config.crd;
        if crd.fallback_timeout_seconds >= crd.timeout_seconds {
            anyhow::bail!(
                "crd.fallbackTimeoutSeconds ({}) must be less than crd.timeoutSeconds ({})",
                crd.fallback_timeout_seconds,
                crd.timeout_seconds
            );
        }
        if crd.max_relationships == 0 {
            anyhow::bail!("crd.maxRelationships must be at least 1");
        }
        if crd.fallback_max_relationships == 0
            || crd.fallback_max_relationships >= crd.max_relationships
        {
            anyhow::bail!(
                "crd.fallbackMaxRelationships ({}) must be between 1 and crd.maxRelationships ({})",
                crd.fallback_max_relationships,
                crd.max_relationships
            );
        }

        if config.view.refresh_interval_seconds == 0 {
            anyhow::bail!("view.refreshIntervalSeconds must be at least 1");
        }

        url::Url::parse(&config.collaborator.base_url).with_context(|| {
            format!(
                "collaborator.baseUrl is not a valid URL: {}",
                config.collaborator.base_url
            )
        })?;

        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut Config) -> Result<()> {
        if let Ok(base_url) = std::env::var("KUBEGRAPH_BASE_URL") {
            config.collaborator.base_url = base_url;
        }

        if let Ok(namespace) = std::env::var("KUBEGRAPH_NAMESPACE") {
            config.default_namespace = namespace;
        }

        if let Ok(timeout) = std::env::var("KUBEGRAPH_TIMEOUT_SECONDS") {
            config.retrieval.timeout_seconds = timeout
                .parse()
                .context("KUBEGRAPH_TIMEOUT_SECONDS must be a number of seconds")?;
        }

        Ok(())
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.retrieval.max_nodes, 1000);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.retrieval.max_nodes = 42;
        config.retrieval.fallback_max_nodes = 10;
        ConfigLoader::save(&config, &path).unwrap();

        let loaded = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_slow_fallback() {
        let mut config = Config::default();
        config.crd.fallback_timeout_seconds = config.crd.timeout_seconds;
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("crd.fallbackTimeoutSeconds"));
    }

    #[test]
    fn test_validate_rejects_large_fallback() {
        let mut config = Config::default();
        config.retrieval.fallback_max_nodes = config.retrieval.max_nodes;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
        // No other test in this binary reads these variables.
        unsafe {
            std::env::set_var("KUBEGRAPH_BASE_URL", "http://graph.test:9000/api");
            std::env::set_var("KUBEGRAPH_TIMEOUT_SECONDS", "45");
        }

        let mut config = Config::default();
        let result = ConfigLoader::apply_env_overrides(&mut config);

        // SAFETY: see above
        unsafe {
            std::env::remove_var("KUBEGRAPH_BASE_URL");
            std::env::remove_var("KUBEGRAPH_TIMEOUT_SECONDS");
        }

        result.unwrap();
        assert_eq!(config.collaborator.base_url, "http://graph.test:9000/api");
        assert_eq!(config.retrieval.timeout_seconds, 45);
    }
}
