use batch_transform_engine::EngineConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Full application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Transform service settings
    pub adapter: AdapterConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// POST each file to an HTTP endpoint
    Http,
    /// Copy files through unchanged
    Passthrough,
}

/// Transform service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub kind: AdapterKind,
    /// Endpoint receiving the raw file bytes
    pub endpoint: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: AdapterKind::Http,
            endpoint: "http://127.0.0.1:8080/transform".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file and `BT_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `BT_ENGINE__MAX_CONCURRENT=8`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix("BT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.max_concurrent, 4);
        assert_eq!(config.adapter.kind, AdapterKind::Http);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bt.yaml");
        std::fs::write(
            &path,
            "engine:\n  max_concurrent: 6\n  preserve_structure: false\nadapter:\n  kind: passthrough\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.engine.max_concurrent, 6);
        assert!(!config.engine.preserve_structure);
        assert_eq!(config.engine.max_retries, 2);
        assert_eq!(config.adapter.kind, AdapterKind::Passthrough);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(AppConfig::load(Some(path.to_str().unwrap())).is_err());
    }
}
