use crate::types::AwsrtConfig;
use crate::ConfigError;

impl AwsrtConfig {
    /// Validate the configuration and return a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::InvalidValue(
                "server.port".to_string(),
                "port must be non-zero".to_string(),
            ));
        }

        if self.server.host.trim().is_empty() {
            errors.push(ConfigError::InvalidValue(
                "server.host".to_string(),
                "host must not be empty".to_string(),
            ));
        }

        for origin in &self.server.cors_origins {
            if origin.trim().is_empty() {
                errors.push(ConfigError::InvalidValue(
                    "server.cors_origins".to_string(),
                    "origins must not be empty strings".to_string(),
                ));
            }
        }

        if self.server.request_timeout.is_zero() {
            errors.push(ConfigError::InvalidValue(
                "server.request_timeout".to_string(),
                "timeout must be greater than zero".to_string(),
            ));
        }

        if self.server.body_limit.as_bytes() == 0 {
            errors.push(ConfigError::InvalidValue(
                "server.body_limit".to_string(),
                "body limit must be greater than zero".to_string(),
            ));
        }

        if self.server.concurrency_limit == 0 {
            errors.push(ConfigError::InvalidValue(
                "server.concurrency_limit".to_string(),
                "concurrency limit must be at least 1".to_string(),
            ));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            errors.push(ConfigError::InvalidValue(
                "storage.data_dir".to_string(),
                "data directory must not be empty".to_string(),
            ));
        }

        if !is_http_url(&self.client.api_url) {
            errors.push(ConfigError::InvalidValue(
                "client.api_url".to_string(),
                format!("'{}' is not an http(s) URL", self.client.api_url),
            ));
        }

        if self.client.play_interval.is_zero() {
            errors.push(ConfigError::InvalidValue(
                "client.play_interval".to_string(),
                "interval must be greater than zero".to_string(),
            ));
        }

        if self.client.poll_interval.is_zero() {
            errors.push(ConfigError::InvalidValue(
                "client.poll_interval".to_string(),
                "interval must be greater than zero".to_string(),
            ));
        }

        errors
    }

    /// Validate and return Ok(()) if valid, or Err with the first error.
    pub fn validate_or_err(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .map(|rest| !rest.is_empty() && !rest.starts_with('/'))
        .unwrap_or(false)
}
