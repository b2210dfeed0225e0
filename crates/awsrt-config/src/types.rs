use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Human-readable duration (e.g., "250ms", "5s", "2m", "1h").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub std::time::Duration);

impl HumanDuration {
    pub fn from_millis(ms: u64) -> Self {
        HumanDuration(std::time::Duration::from_millis(ms))
    }

    pub fn from_secs(secs: u64) -> Self {
        HumanDuration(std::time::Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> std::time::Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
            (n, "ms")
        } else if let Some(n) = s.strip_suffix('s') {
            (n, "s")
        } else if let Some(n) = s.strip_suffix('m') {
            (n, "m")
        } else if let Some(n) = s.strip_suffix('h') {
            (n, "h")
        } else {
            return Err(format!("Invalid duration format: {}", s));
        };

        let num: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", s))?;

        let too_large = || format!("Duration out of range: {}", s);
        let duration = match unit {
            "ms" => std::time::Duration::from_millis(num),
            "s" => std::time::Duration::from_secs(num),
            "m" => std::time::Duration::from_secs(num.checked_mul(60).ok_or_else(too_large)?),
            _ => std::time::Duration::from_secs(num.checked_mul(3600).ok_or_else(too_large)?),
        };

        Ok(HumanDuration(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        let secs = self.0.as_secs();

        // Only collapse to a coarser unit when nothing is lost.
        if millis % 1000 != 0 {
            write!(f, "{}ms", millis)
        } else if secs % 3600 == 0 && secs > 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs % 60 == 0 && secs > 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HumanDuration::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Human-readable byte size (e.g., "512b", "64kb", "1mb").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HumanBytes(pub u64);

impl HumanBytes {
    pub fn as_bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for HumanBytes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        let (num_str, multiplier) = if let Some(n) = s.strip_suffix("gb") {
            (n, 1024u64 * 1024 * 1024)
        } else if let Some(n) = s.strip_suffix("mb") {
            (n, 1024u64 * 1024)
        } else if let Some(n) = s.strip_suffix("kb") {
            (n, 1024u64)
        } else if let Some(n) = s.strip_suffix('b') {
            (n, 1u64)
        } else {
            (s.as_str(), 1u64)
        };

        let num: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| format!("Invalid number in bytes: {}", s))?;

        num.checked_mul(multiplier)
            .map(HumanBytes)
            .ok_or_else(|| format!("Byte size out of range: {}", s))
    }
}

impl fmt::Display for HumanBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;
        const GB: u64 = 1024 * MB;

        match self.0 {
            b if b >= GB && b % GB == 0 => write!(f, "{}gb", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{}mb", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{}kb", b / KB),
            b => write!(f, "{}b", b),
        }
    }
}

impl Serialize for HumanBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HumanBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HumanBytes::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer (the browser front-end).
    pub cors_origins: Vec<String>,
    pub request_timeout: HumanDuration,
    pub body_limit: HumanBytes,
    pub concurrency_limit: usize,
}

/// On-disk layout root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Manifests are written to `<data_dir>/manifests`, frames to `<data_dir>/runs.sqlite`.
    pub data_dir: PathBuf,
}

impl StorageSection {
    pub fn manifests_dir(&self) -> PathBuf {
        self.data_dir.join("manifests")
    }

    pub fn frames_db(&self) -> PathBuf {
        self.data_dir.join("runs.sqlite")
    }
}

/// Settings used by the API client and the playback driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Delay between step requests while playing.
    pub play_interval: HumanDuration,
    /// Delay between `latest` polls.
    pub poll_interval: HumanDuration,
}

/// Top-level AWSRT configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AwsrtConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub client: ClientSection,
}
