use rand::Rng;

use crate::error::{CoreError, CoreResult};
use crate::raster::Raster;

/// Registered fire spread models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadModel {
    /// Toy 4-neighbour Bernoulli spread.
    E2Base,
}

impl SpreadModel {
    pub const ALL: [SpreadModel; 1] = [SpreadModel::E2Base];

    pub fn from_name(name: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "unknown spread model '{}', expected one of: {}",
                    name,
                    Self::ALL.map(|m| m.name()).join(", ")
                ))
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpreadModel::E2Base => "E2_base",
        }
    }

    /// Advance the hidden state by one step.
    pub fn step<R: Rng + ?Sized>(&self, state: &Raster<u8>, q: f64, rng: &mut R) -> Raster<u8> {
        match self {
            SpreadModel::E2Base => step_von_neumann(state, q, rng),
        }
    }
}

/// Each unburnt cell with a burning up/down/left/right neighbour ignites with
/// probability `q`; burning cells stay burning.
///
/// Neighbours are read from `state`, so fire advances at most one cell per
/// step. When `q > 0` exactly one uniform draw is consumed per cell, in
/// row-major order, whether or not the cell is a candidate.
pub fn step_von_neumann<R: Rng + ?Sized>(state: &Raster<u8>, q: f64, rng: &mut R) -> Raster<u8> {
    let (h, w) = (state.height(), state.width());
    let mut out = state.clone();
    if q <= 0.0 {
        return out;
    }

    for row in 0..h {
        for col in 0..w {
            let draw: f64 = rng.gen();
            if state.get(row, col) != 0 {
                continue;
            }
            let neighbour_on = (row > 0 && state.get(row - 1, col) != 0)
                || (row + 1 < h && state.get(row + 1, col) != 0)
                || (col > 0 && state.get(row, col - 1) != 0)
                || (col + 1 < w && state.get(row, col + 1) != 0);
            if neighbour_on && draw < q {
                out.set(row, col, 1);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn single(h: usize, w: usize, row: usize, col: usize) -> Raster<u8> {
        let mut r = Raster::filled(h, w, 0u8);
        r.set(row, col, 1);
        r
    }

    #[test]
    fn test_model_registry() {
        assert_eq!(SpreadModel::from_name("E2_base").unwrap(), SpreadModel::E2Base);
        let err = SpreadModel::from_name("E9_turbo").unwrap_err();
        assert!(err.to_string().contains("E2_base"));
    }

    #[test]
    fn test_zero_probability_is_identity() {
        let s = single(5, 5, 2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(step_von_neumann(&s, 0.0, &mut rng), s);
    }

    #[test]
    fn test_certain_spread_lights_exact_cross() {
        let s = single(5, 5, 2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let next = step_von_neumann(&s, 1.0, &mut rng);
        assert_eq!(next.count_on(), 5);
        for (r, c) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(next.get(r, c), 1, "({r},{c}) should burn");
        }
        assert_eq!(next.get(1, 1), 0);
    }

    #[test]
    fn test_corner_ignition_respects_edges() {
        let s = single(3, 3, 0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let next = step_von_neumann(&s, 1.0, &mut rng);
        assert_eq!(next.count_on(), 3);
        assert_eq!(next.get(0, 1), 1);
        assert_eq!(next.get(1, 0), 1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let s = single(16, 16, 8, 8);
        let a = step_von_neumann(&s, 0.5, &mut ChaCha8Rng::seed_from_u64(42));
        let b = step_von_neumann(&s, 0.5, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_burning_cells_stay_burning(
            h in 1usize..12,
            w in 1usize..12,
            cells in proptest::collection::vec(any::<bool>(), 144),
            q in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let data: Vec<u8> = cells.iter().take(h * w).map(|&b| b as u8).collect();
            let state = Raster::from_vec(h, w, data).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let next = step_von_neumann(&state, q, &mut rng);

            prop_assert!(next.count_on() >= state.count_on());
            for row in 0..h {
                for col in 0..w {
                    if state.get(row, col) == 1 {
                        prop_assert_eq!(next.get(row, col), 1);
                    }
                    if next.get(row, col) == 1 && state.get(row, col) == 0 {
                        // New ignitions only appear next to existing fire.
                        let near = (row > 0 && state.get(row - 1, col) == 1)
                            || (row + 1 < h && state.get(row + 1, col) == 1)
                            || (col > 0 && state.get(row, col - 1) == 1)
                            || (col + 1 < w && state.get(row, col + 1) == 1);
                        prop_assert!(near);
                    }
                }
            }
        }
    }
}
