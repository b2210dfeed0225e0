//! PNG rendering of hidden-state and belief rasters.

mod colormap;
mod png;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use colormap::Colormap;
pub use png::{belief_to_png, legend_belief_png, state_to_png, LEGEND_HEIGHT, LEGEND_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    /// One pixel per cell, nearest neighbour.
    #[default]
    Fast,
    /// Twice the resolution with bilinear smoothing.
    Pub,
}

fn default_cmap() -> String {
    "viridis".to_string()
}

fn default_vmax() -> f64 {
    1.0
}

/// Colour mapping options for belief images, taken from a query string or a
/// preview body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldImageParams {
    #[serde(default = "default_cmap")]
    pub cmap: String,
    #[serde(default)]
    pub vmin: f64,
    #[serde(default = "default_vmax")]
    pub vmax: f64,
    #[serde(default)]
    pub quality: RenderQuality,
}

impl Default for FieldImageParams {
    fn default() -> Self {
        FieldImageParams {
            cmap: default_cmap(),
            vmin: 0.0,
            vmax: default_vmax(),
            quality: RenderQuality::Fast,
        }
    }
}

impl FieldImageParams {
    /// Resolve the colormap and check the value range.
    pub fn colormap(&self) -> CoreResult<Colormap> {
        if !(self.vmin.is_finite() && self.vmax.is_finite()) || self.vmin >= self.vmax {
            return Err(CoreError::validation(format!(
                "value range must satisfy vmin < vmax, got [{}, {}]",
                self.vmin, self.vmax
            )));
        }
        Colormap::from_name(&self.cmap)
    }
}
