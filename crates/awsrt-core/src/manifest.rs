//! Persisted environment, fire, and run descriptions.
//!
//! Field names match the JSON the front-end sends and the manifest files on
//! disk, so grid dimensions serialize as `H` and `W`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_CRS: &str = "EPSG:32612";
pub const DEFAULT_MODEL: &str = "E2_base";

/// Largest accepted grid edge, in cells.
pub const MAX_GRID_DIM: u32 = 4096;
/// Largest accepted grid area, in cells.
pub const MAX_GRID_CELLS: u64 = 4 * 1024 * 1024;

fn default_crs() -> String {
    DEFAULT_CRS.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Raster grid definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    #[serde(rename = "H")]
    pub height: u32,
    #[serde(rename = "W")]
    pub width: u32,
    /// Cell edge length in metres.
    pub cell_size: f64,
    #[serde(default = "default_crs")]
    pub crs_code: String,
}

impl GridSpec {
    pub fn new(height: u32, width: u32, cell_size: f64) -> Self {
        GridSpec {
            height,
            width,
            cell_size,
            crs_code: default_crs(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.height == 0 || self.width == 0 {
            return Err(CoreError::validation(format!(
                "grid must have positive dimensions, got {}x{}",
                self.height, self.width
            )));
        }
        if self.height > MAX_GRID_DIM || self.width > MAX_GRID_DIM {
            return Err(CoreError::validation(format!(
                "grid edges are limited to {} cells, got {}x{}",
                MAX_GRID_DIM, self.height, self.width
            )));
        }
        let cells = u64::from(self.height).checked_mul(u64::from(self.width));
        if cells.map_or(true, |n| n > MAX_GRID_CELLS) {
            return Err(CoreError::validation(format!(
                "grid is limited to {} cells, got {}x{}",
                MAX_GRID_CELLS, self.height, self.width
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(CoreError::validation(format!(
                "cell_size must be a positive number of metres, got {}",
                self.cell_size
            )));
        }
        if self.crs_code.trim().is_empty() {
            return Err(CoreError::validation("crs_code must not be empty"));
        }
        Ok(())
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        (0..i64::from(self.height)).contains(&row) && (0..i64::from(self.width)).contains(&col)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentManifest {
    pub env_id: String,
    pub grid: GridSpec,
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub terrain_elev_path: Option<String>,
    #[serde(default)]
    pub feasibility_mask_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionCell {
    pub row: i64,
    pub col: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IgnitionKind {
    #[default]
    Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnitionSpec {
    #[serde(rename = "type", default)]
    pub kind: IgnitionKind,
    pub locations: Vec<IgnitionCell>,
    /// Step at which the ignitions are lit.
    #[serde(default)]
    pub t0: i64,
}

impl IgnitionSpec {
    pub fn point(row: i64, col: i64) -> Self {
        IgnitionSpec {
            kind: IgnitionKind::Point,
            locations: vec![IgnitionCell { row, col }],
            t0: 0,
        }
    }

    /// Reject empty ignition sets, negative start steps, and cells outside `grid`.
    pub fn validate(&self, grid: &GridSpec) -> CoreResult<()> {
        if self.locations.is_empty() {
            return Err(CoreError::validation(
                "ignitions must contain at least one location",
            ));
        }
        if self.t0 < 0 {
            return Err(CoreError::validation(format!(
                "ignition t0 must be non-negative, got {}",
                self.t0
            )));
        }
        if let Some(cell) = self
            .locations
            .iter()
            .find(|c| !grid.contains(c.row, c.col))
        {
            return Err(CoreError::validation(format!(
                "ignition ({}, {}) lies outside the {}x{} grid",
                cell.row, cell.col, grid.height, grid.width
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireManifest {
    pub fire_id: String,
    pub env_id: String,
    pub ignitions: IgnitionSpec,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub seed: i64,
}

/// Everything a run needs to step without reloading its manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run_id: String,
    pub env_id: String,
    pub fire_id: String,
    pub run_name: String,
    pub dt_seconds: u64,
    pub horizon_steps: u32,
    pub spread_prob: f64,
    pub model: String,
    pub env_seed: i64,
    pub fire_seed: i64,
    #[serde(rename = "H")]
    pub height: u32,
    #[serde(rename = "W")]
    pub width: u32,
    pub created_at: DateTime<Utc>,
}
