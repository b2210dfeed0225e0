//! Configuration for the AWSRT wildfire simulation service and its client.
//!
//! A YAML file with `${VAR}` interpolation, layered under `AWSRT_*`
//! environment overrides and on top of built-in defaults.

mod defaults;
mod env;
pub mod types;
mod validation;

use std::path::{Path, PathBuf};

pub use defaults::{DEFAULT_API_URL, DEFAULT_PORT};
pub use env::{interpolate_env, ENV_API_URL, ENV_DATA_DIR, ENV_HOST, ENV_PORT};
pub use types::*;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "AWSRT_CONFIG";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing environment variables: {0:?}")]
    MissingEnvVars(Vec<String>),

    #[error("Invalid value for environment override {0}: '{1}'")]
    InvalidEnvOverride(String, String),

    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(String, String),
}

impl AwsrtConfig {
    /// Parse a configuration from a YAML string.
    /// Environment variables in the format `${VAR_NAME}` will be interpolated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let interpolated = env::interpolate_env(yaml)?;

        // An empty or comment-only file deserializes to `null`.
        if interpolated.trim().is_empty() {
            return Ok(AwsrtConfig::default());
        }

        let config: AwsrtConfig = serde_yaml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Load a configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given (or the discovered default file), apply
    /// environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(find_config) {
            Some(p) => Self::from_file(&p)?,
            None => AwsrtConfig::default(),
        };
        config.apply_env_overrides()?;
        config.validate_or_err()?;
        Ok(config)
    }

    /// Serialize back to YAML (used by `awsrt config`).
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Locate a config file: `$AWSRT_CONFIG`, `./awsrt.yaml`, then
/// `~/.config/awsrt/config.yaml`.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from("awsrt.yaml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    if let Some(home) = dirs_next::home_dir() {
        let home_config = home.join(".config/awsrt/config.yaml");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
server:
  port: 9001
storage:
  data_dir: /tmp/awsrt
"#;

        let config = AwsrtConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/awsrt"));
        assert_eq!(config.client.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_parse_human_units() {
        let yaml = r#"
server:
  request_timeout: 5s
  body_limit: 64kb
client:
  play_interval: 100ms
  poll_interval: 2s
"#;

        let config = AwsrtConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.request_timeout.as_duration().as_secs(), 5);
        assert_eq!(config.server.body_limit.as_bytes(), 64 * 1024);
        assert_eq!(config.client.play_interval.as_duration().as_millis(), 100);
        assert_eq!(config.client.poll_interval.as_duration().as_millis(), 2000);
    }

    #[test]
    fn test_parse_with_env_vars() {
        std::env::set_var("AWSRT_TEST_DATA_ROOT", "/tmp/awsrt-env");

        let yaml = r#"
storage:
  data_dir: ${AWSRT_TEST_DATA_ROOT}/data
"#;

        let config = AwsrtConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/awsrt-env/data"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AwsrtConfig::from_yaml("# nothing here\n").unwrap_or_default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        let config = AwsrtConfig::from_yaml("").unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_unknown_unit_is_yaml_error() {
        let yaml = "client:\n  play_interval: fast\n";
        assert!(matches!(
            AwsrtConfig::from_yaml(yaml),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_units() {
        let yaml = AwsrtConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("play_interval: 250ms"));
        assert!(yaml.contains("body_limit: 1mb"));
        let back = AwsrtConfig::from_yaml(&yaml).unwrap();
        assert_eq!(back.client.play_interval, AwsrtConfig::default().client.play_interval);
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("awsrt-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("awsrt.yaml");
        std::fs::write(&path, "server:\n  port: 8123\n").unwrap();

        let config = AwsrtConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8123);

        std::fs::remove_dir_all(&dir).ok();
    }
}
