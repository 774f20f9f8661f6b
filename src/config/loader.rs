//! Configuration loader with environment variable expansion

use super::{expand_env_vars, Config, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// The whole file is env-expanded before parsing, so any value can use
    /// `${VAR}` or `${VAR:-default}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_load_expands_env_vars() {
        std::env::set_var("ENRICHR_TEST_ENDPOINT", "https://api.example.com/v1/lookup");
        std::env::remove_var("ENRICHR_TEST_API_KEY");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enrich:\n  endpoint: ${{ENRICHR_TEST_ENDPOINT}}\n  api_key: ${{ENRICHR_TEST_API_KEY:-dev-key}}"
        )
        .unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.enrich.endpoint, "https://api.example.com/v1/lookup");
        assert_eq!(config.enrich.api_key, "dev-key");

        std::env::remove_var("ENRICHR_TEST_ENDPOINT");
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enrich:\n  endpoint: not-a-url").unwrap();

        let result = ConfigLoader::load(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = ConfigLoader::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
