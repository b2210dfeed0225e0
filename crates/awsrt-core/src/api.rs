//! Request and response bodies of the HTTP contract, shared by server and client.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::manifest::{GridSpec, IgnitionSpec, DEFAULT_MODEL};
use crate::render::FieldImageParams;
use crate::sim::Prior;

// --- Manifests ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnvironment {
    pub grid: GridSpec,
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub terrain_elev_path: Option<String>,
    #[serde(default)]
    pub feasibility_mask_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnvironmentResponse {
    pub env_id: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFire {
    pub env_id: String,
    pub ignitions: IgnitionSpec,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub seed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFireResponse {
    pub fire_id: String,
}

/// Environment summary for dropdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvRow {
    pub env_id: String,
    #[serde(rename = "H")]
    pub height: u32,
    #[serde(rename = "W")]
    pub width: u32,
    pub cell_size: f64,
    pub crs_code: String,
}

/// Fire summary for dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireRow {
    pub fire_id: String,
    pub env_id: String,
    pub model: String,
    pub n_ignitions: usize,
}

/// One JSON file in the manifests directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestListing {
    pub manifests: Vec<ManifestEntry>,
}

// --- Runs ---

fn default_run_name() -> String {
    "run".to_string()
}

fn default_dt_seconds() -> u64 {
    3600
}

fn default_horizon_steps() -> u32 {
    24
}

fn default_spread_prob() -> f64 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitRunRequest {
    pub env_id: String,
    pub fire_id: String,
    #[serde(default = "default_run_name")]
    pub run_name: String,
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: u64,
    #[serde(default = "default_horizon_steps")]
    pub horizon_steps: u32,
    /// Per-neighbour ignition probability of the toy spread model.
    #[serde(default = "default_spread_prob")]
    pub spread_prob: f64,
}

impl InitRunRequest {
    pub fn new(env_id: impl Into<String>, fire_id: impl Into<String>) -> Self {
        InitRunRequest {
            env_id: env_id.into(),
            fire_id: fire_id.into(),
            run_name: default_run_name(),
            dt_seconds: default_dt_seconds(),
            horizon_steps: default_horizon_steps(),
            spread_prob: default_spread_prob(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.dt_seconds < 1 {
            return Err(CoreError::validation("dt_seconds must be at least 1"));
        }
        if self.horizon_steps < 1 {
            return Err(CoreError::validation("horizon_steps must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.spread_prob) {
            return Err(CoreError::validation(format!(
                "spread_prob must lie in [0, 1], got {}",
                self.spread_prob
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRunResponse {
    pub run_id: String,
    pub t: u32,
    pub dt_seconds: u64,
    pub horizon_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    pub run_id: String,
    pub t: u32,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestResponse {
    pub run_id: String,
    pub t_latest: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    #[serde(rename = "H")]
    pub height: u32,
    #[serde(rename = "W")]
    pub width: u32,
    /// Number of stored time slices.
    #[serde(rename = "T")]
    pub frames: u32,
}

// --- Preview ---

fn default_prior_strength() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefPreviewRequest {
    pub env_id: String,
    #[serde(default)]
    pub prior: Prior,
    #[serde(default = "default_prior_strength")]
    pub prior_strength: f64,
    #[serde(flatten)]
    pub image: FieldImageParams,
}

impl BeliefPreviewRequest {
    pub fn uniform(env_id: impl Into<String>) -> Self {
        BeliefPreviewRequest {
            env_id: env_id.into(),
            prior: Prior::Uniform,
            prior_strength: default_prior_strength(),
            image: FieldImageParams::default(),
        }
    }
}

// --- Service ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub detail: Option<String>,
}
