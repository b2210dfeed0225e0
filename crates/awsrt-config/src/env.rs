use regex::Regex;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::{AwsrtConfig, ConfigError};

pub const ENV_API_URL: &str = "AWSRT_API_URL";
pub const ENV_DATA_DIR: &str = "AWSRT_DATA_DIR";
pub const ENV_HOST: &str = "AWSRT_HOST";
pub const ENV_PORT: &str = "AWSRT_PORT";

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("placeholder pattern is valid")
    })
}

/// Interpolate environment variables in a string.
///
/// `${VAR}` is replaced by the variable's value; `${VAR:-fallback}` uses
/// `fallback` when the variable is unset. Every unset variable without a
/// fallback is reported at once.
pub fn interpolate_env(input: &str) -> Result<String, ConfigError> {
    interpolate_with(input, |name| env::var(name).ok())
}

pub(crate) fn interpolate_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();

    let result = placeholder_re().replace_all(input, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match (lookup(name), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(fallback)) => fallback.as_str().to_string(),
            (None, None) => {
                if !missing.contains(&name.to_string()) {
                    missing.push(name.to_string());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars(missing));
    }

    Ok(result.into_owned())
}

impl AwsrtConfig {
    /// Apply `AWSRT_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|name| env::var(name).ok())
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.client.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvOverride(ENV_PORT.to_string(), port))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_interpolate_env() {
        env::set_var("AWSRT_TEST_HOST", "0.0.0.0");
        let result = interpolate_env("host: ${AWSRT_TEST_HOST}").unwrap();
        assert_eq!(result, "host: 0.0.0.0");
    }

    #[test]
    fn test_interpolate_fallback_used_when_unset() {
        let result = interpolate_with("dir: ${NOPE:-./data}", vars(&[])).unwrap();
        assert_eq!(result, "dir: ./data");
    }

    #[test]
    fn test_interpolate_value_beats_fallback() {
        let result = interpolate_with("dir: ${DIR:-./data}", vars(&[("DIR", "/srv")])).unwrap();
        assert_eq!(result, "dir: /srv");
    }

    #[test]
    fn test_interpolate_reports_every_missing_var_once() {
        let result = interpolate_with("${A} ${B} ${A}", vars(&[]));
        match result {
            Err(ConfigError::MissingEnvVars(names)) => {
                assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("Expected MissingEnvVars, got {:?}", other),
        }
    }

    #[test]
    fn test_interpolate_leaves_bare_dollar_alone() {
        let result = interpolate_with("cost $VAR and ${unclosed", vars(&[])).unwrap();
        assert_eq!(result, "cost $VAR and ${unclosed");
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = AwsrtConfig::default();
        config
            .apply_overrides_from(vars(&[
                (ENV_API_URL, "http://sim.example:9000/"),
                (ENV_DATA_DIR, "/var/lib/awsrt"),
                (ENV_PORT, "9000"),
            ]))
            .unwrap();
        assert_eq!(config.client.api_url, "http://sim.example:9000");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/awsrt"));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_bad_port_override_rejected() {
        let mut config = AwsrtConfig::default();
        let err = config
            .apply_overrides_from(vars(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvOverride(name, _) if name == ENV_PORT));
    }
}
