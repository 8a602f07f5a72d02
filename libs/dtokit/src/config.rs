use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::DtoError;

static INSTALLED: OnceLock<EngineConfig> = OnceLock::new();
static DEFAULT: EngineConfig = EngineConfig {
    cache_metadata: true,
    json_max_depth: 512,
};

/// Process-wide engine settings, parsed from TOML.
///
/// ```toml
/// cache_metadata = true
/// json_max_depth = 512
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Resolve field metadata once per type and share it.
    pub cache_metadata: bool,

    /// Default `max_depth` of JSON-string fields.
    pub json_max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        DEFAULT.clone()
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, DtoError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DtoError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, DtoError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        if config.json_max_depth == 0 {
            return Err(DtoError::Config("json_max_depth must be at least 1".into()));
        }
        Ok(config)
    }
}

/// Install `config` for the rest of the process.
///
/// Only the first call wins; later calls fail with `Config`.
pub fn install(config: EngineConfig) -> Result<(), DtoError> {
    let summary = format!("{config:?}");
    INSTALLED
        .set(config)
        .map_err(|_| DtoError::Config("engine config is already installed".into()))?;
    tracing::info!(config = %summary, "engine config installed");
    Ok(())
}

/// Installed config, or the defaults when none was installed.
pub fn current() -> &'static EngineConfig {
    INSTALLED.get().unwrap_or(&DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let cfg = EngineConfig::from_toml_str("cache_metadata = false\njson_max_depth = 16").unwrap();
        assert!(!cfg.cache_metadata);
        assert_eq!(cfg.json_max_depth, 16);
    }

    #[test]
    fn unknown_and_invalid_values_are_config_errors() {
        for src in ["cache = true", "json_max_depth = 0", "json_max_depth = \"deep\""] {
            let err = EngineConfig::from_toml_str(src).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{src}");
        }
    }

    #[test]
    fn load_reads_a_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dtokit.toml");
        std::fs::write(&path, "json_max_depth = 64\n").unwrap();

        let cfg = EngineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.json_max_depth, 64);
        assert!(cfg.cache_metadata);

        let missing = dir.path().join("absent.toml");
        let err = EngineConfig::load(missing.to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn current_falls_back_to_defaults() {
        assert!(current().json_max_depth > 0);
    }
}
