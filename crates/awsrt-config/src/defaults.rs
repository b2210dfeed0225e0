use std::path::PathBuf;

use crate::types::{ClientSection, HumanBytes, HumanDuration, ServerSection, StorageSection};

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Dev front-end origins.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BODY_LIMIT: u64 = 1024 * 1024;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 256;

/// ~4 frames per second.
pub const DEFAULT_PLAY_INTERVAL_MS: u64 = 250;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 800;

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            request_timeout: HumanDuration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            body_limit: HumanBytes(DEFAULT_BODY_LIMIT),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        StorageSection {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ClientSection {
    fn default() -> Self {
        ClientSection {
            api_url: DEFAULT_API_URL.to_string(),
            play_interval: HumanDuration::from_millis(DEFAULT_PLAY_INTERVAL_MS),
            poll_interval: HumanDuration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}
