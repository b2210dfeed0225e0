use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::manifest::{EnvironmentManifest, FireManifest, GridSpec};
use crate::raster::Raster;

/// Belief value of a cell with no information.
pub const UNINFORMED: f32 = 0.5;

/// Prior distribution for the initial belief map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Prior {
    #[default]
    Uniform,
}

/// Initial belief over `grid`.
///
/// `strength` must be a non-negative finite number. A uniform prior carries no
/// spatial information, so its strength does not change the map.
pub fn init_belief(grid: &GridSpec, prior: Prior, strength: f64) -> CoreResult<Raster<f32>> {
    if !(strength.is_finite() && strength >= 0.0) {
        return Err(CoreError::validation(format!(
            "prior_strength must be a non-negative number, got {}",
            strength
        )));
    }
    let (h, w) = (grid.height as usize, grid.width as usize);
    match prior {
        Prior::Uniform => Ok(Raster::filled(h, w, UNINFORMED)),
    }
}

/// Belief at t=0 of a run. The fire's ignitions do not inform it yet.
pub fn init_belief_with_priors(
    env: &EnvironmentManifest,
    _fire: &FireManifest,
) -> CoreResult<Raster<f32>> {
    init_belief(&env.grid, Prior::Uniform, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_is_half_everywhere() {
        let b = init_belief(&GridSpec::new(3, 4, 1.0), Prior::Uniform, 1.0).unwrap();
        assert_eq!(b.len(), 12);
        assert!(b.as_slice().iter().all(|&v| v == UNINFORMED));
    }

    #[test]
    fn test_strength_validation() {
        let grid = GridSpec::new(2, 2, 1.0);
        assert!(init_belief(&grid, Prior::Uniform, 0.0).is_ok());
        assert!(init_belief(&grid, Prior::Uniform, -0.1).is_err());
        assert!(init_belief(&grid, Prior::Uniform, f64::INFINITY).is_err());
    }
}
