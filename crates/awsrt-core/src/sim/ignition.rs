use tracing::warn;

use crate::manifest::{GridSpec, IgnitionSpec};
use crate::raster::Raster;

/// Hidden state at t=0: zeros with a 1 at every ignition cell.
///
/// Cells outside the grid are skipped; fires are validated on creation, so
/// this only matters for manifests written by hand.
pub fn state_from_ignitions(grid: &GridSpec, ignitions: &IgnitionSpec) -> Raster<u8> {
    let mut state = Raster::filled(grid.height as usize, grid.width as usize, 0u8);
    for cell in &ignitions.locations {
        if grid.contains(cell.row, cell.col) {
            state.set(cell.row as usize, cell.col as usize, 1);
        } else {
            warn!(row = cell.row, col = cell.col, "Skipping out-of-grid ignition");
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{IgnitionCell, IgnitionKind};

    #[test]
    fn test_marks_each_location() {
        let grid = GridSpec::new(4, 6, 100.0);
        let spec = IgnitionSpec {
            kind: IgnitionKind::Point,
            locations: vec![
                IgnitionCell { row: 0, col: 0 },
                IgnitionCell { row: 3, col: 5 },
                IgnitionCell { row: 3, col: 5 },
            ],
            t0: 0,
        };
        let s0 = state_from_ignitions(&grid, &spec);
        assert_eq!((s0.height(), s0.width()), (4, 6));
        assert_eq!(s0.count_on(), 2);
        assert_eq!(s0.get(3, 5), 1);
    }

    #[test]
    fn test_skips_out_of_grid() {
        let grid = GridSpec::new(2, 2, 1.0);
        let spec = IgnitionSpec::point(5, -1);
        assert_eq!(state_from_ignitions(&grid, &spec).count_on(), 0);
    }
}
