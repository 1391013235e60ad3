use crate::classify::{Class, ClassPolicy, DistanceBands};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::raster::DistanceField;

/// Per-cell derived tuple for one populated grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    /// Population magnitude (absolute under the sign policy).
    pub population: f64,
    pub class: Class,
    pub distance_km: f64,
    pub band: usize,
}

/// Produce a Cell Record for every populated cell: no-data and zero-valued
/// cells are excluded entirely. The distance field must be congruent to the
/// population grid.
pub fn cell_records(
    grid: &Grid,
    distances: &DistanceField,
    policy: ClassPolicy,
    bands: &DistanceBands,
) -> Result<Vec<CellRecord>> {
    if !distances.congruent_with(grid) {
        return Err(Error::Config("distance field is not congruent to the population grid".into()));
    }

    let mut records = Vec::new();
    for ((row, col), value) in grid.data().indexed_iter() {
        if grid.is_nodata(*value) || *value == 0.0 {
            continue;
        }
        let (class, population) = policy.classify(*value);
        let distance_km = distances.km(row, col);
        records.push(CellRecord {
            row,
            col,
            population,
            class,
            distance_km,
            band: bands.band_of(distance_km),
        });
    }
    Ok(records)
}
