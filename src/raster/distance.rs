//! Exact Euclidean distance transform over an occupancy grid.

use ndarray::{Array2, Axis};
use ndarray::parallel::prelude::*;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridTransform};
use super::OccupancyGrid;

// Finite stand-in for "no occupied cell in this column"; squared it still
// fits comfortably in an f64.
const FAR: f64 = 1e12;

/// A grid of straight-line distances (kilometers) from each cell center to
/// the nearest occupied cell, congruent to its reference grid.
#[derive(Debug, Clone)]
pub struct DistanceField {
    data: Array2<f64>,
    transform: GridTransform,
    epsg: u32,
}

impl DistanceField {
    #[inline] pub fn rows(&self) -> usize { self.data.nrows() }
    #[inline] pub fn cols(&self) -> usize { self.data.ncols() }
    #[inline] pub fn shape(&self) -> (usize, usize) { self.data.dim() }
    #[inline] pub fn transform(&self) -> &GridTransform { &self.transform }
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }
    #[inline] pub fn data(&self) -> &Array2<f64> { &self.data }

    #[inline]
    pub fn km(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Same shape and pixel geometry as the reference grid.
    pub fn congruent_with(&self, grid: &Grid) -> bool {
        self.shape() == grid.shape() && self.transform == *grid.transform()
    }
}

/// Compute the distance field for an occupancy grid with (possibly
/// anisotropic) physical cell sizes in kilometers. Fails with
/// `NoReferenceFeaturesError` when nothing is occupied, since every
/// distance would be undefined.
pub fn compute_distances(
    occupancy: &OccupancyGrid,
    cell_size_x_km: f64,
    cell_size_y_km: f64,
) -> Result<DistanceField> {
    if cell_size_x_km <= 0.0 || cell_size_y_km <= 0.0 {
        return Err(Error::Config("cell sizes must be positive".into()));
    }
    if occupancy.occupied_count() == 0 {
        return Err(Error::NoReferenceFeatures);
    }

    let (rows, cols) = occupancy.shape();

    // Pass 1: per-column scan gives the vertical distance (km) to the
    // nearest occupied cell in the same column.
    let mut field = Array2::from_elem((rows, cols), f64::INFINITY);
    field.axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(col, mut column)| {
            let mut dist = f64::INFINITY;
            for row in 0..rows {
                dist = if occupancy.is_occupied(row, col) { 0.0 } else { dist + cell_size_y_km };
                column[row] = dist;
            }
            dist = f64::INFINITY;
            for row in (0..rows).rev() {
                dist = if occupancy.is_occupied(row, col) { 0.0 } else { dist + cell_size_y_km };
                if dist < column[row] {
                    column[row] = dist;
                }
            }
        });

    // Pass 2: per-row lower envelope of parabolas (Felzenszwalb &
    // Huttenlocher) over squared distances, sampled at the x cell pitch.
    field.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            let f: Vec<f64> = row.iter()
                .map(|d| {
                    let d = d.min(FAR);
                    d * d
                })
                .collect();
            let d = lower_envelope(&f, cell_size_x_km);
            for (cell, dist_sq) in row.iter_mut().zip(d) {
                *cell = dist_sq.sqrt();
            }
        });

    Ok(DistanceField {
        data: field,
        transform: *occupancy.transform(),
        epsg: occupancy.epsg(),
    })
}

/// 1D squared-distance transform: for each sample position `q * step`,
/// the minimum of `f[v] + (step * (q - v))^2` over all v.
fn lower_envelope(f: &[f64], step: f64) -> Vec<f64> {
    let n = f.len();
    let mut d = vec![0.0; n];
    let mut v = vec![0usize; n]; // parabola apexes
    let mut z = vec![0.0; n + 1]; // envelope breakpoints

    let x = |q: usize| q as f64 * step;

    let mut k = 0;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s;
        loop {
            let p = v[k];
            s = ((f[q] + x(q) * x(q)) - (f[p] + x(p) * x(p))) / (2.0 * x(q) - 2.0 * x(p));
            if s <= z[k] {
                k -= 1;
            } else {
                break;
            }
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for q in 0..n {
        while z[k + 1] < x(q) {
            k += 1;
        }
        let dx = x(q) - x(v[k]);
        d[q] = dx * dx + f[v[k]];
    }
    d
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use ndarray::Array2;

    use crate::features::{Feature, FeatureSet};
    use crate::grid::{Grid, GridTransform};
    use crate::raster::rasterize;
    use crate::error::Error;
    use super::compute_distances;

    fn occupancy_with_points(rows: usize, cols: usize, points: &[(f64, f64)]) -> crate::raster::OccupancyGrid {
        let t = GridTransform::north_up(0.0, rows as f64, 1.0, 1.0).unwrap();
        let grid = Grid::from_array(Array2::from_elem((rows, cols), 1.0), t, 32633, -9999.0).unwrap();
        let features = points.iter()
            .map(|&(x, y)| Feature::new(Point::new(x, y).into()))
            .collect();
        rasterize(&FeatureSet::new(features, Some(32633)), &grid).unwrap()
    }

    #[test]
    fn distances_from_a_corner_cell() {
        // Occupied cell at row 0, col 0 of a 4x4 grid, 1 km cells.
        let occ = occupancy_with_points(4, 4, &[(0.5, 3.5)]);
        let field = compute_distances(&occ, 1.0, 1.0).unwrap();

        assert_eq!(field.km(0, 0), 0.0);
        assert!((field.km(0, 1) - 1.0).abs() < 1e-9);
        assert!((field.km(1, 0) - 1.0).abs() < 1e-9);
        assert!((field.km(1, 1) - 2f64.sqrt()).abs() < 1e-9);
        assert!((field.km(0, 2) - 2.0).abs() < 1e-9);
        assert!((field.km(1, 2) - 5f64.sqrt()).abs() < 1e-9);
        assert!((field.km(3, 3) - 18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn nearest_of_two_references_wins() {
        let occ = occupancy_with_points(4, 4, &[(0.5, 3.5), (3.5, 0.5)]);
        let field = compute_distances(&occ, 1.0, 1.0).unwrap();
        assert_eq!(field.km(0, 0), 0.0);
        assert_eq!(field.km(3, 3), 0.0);
        // Center cells are equidistant from both corners.
        assert!((field.km(1, 2) - 5f64.sqrt()).abs() < 1e-9);
        assert!((field.km(2, 1) - 5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn anisotropic_cells_scale_each_axis() {
        let occ = occupancy_with_points(3, 3, &[(0.5, 2.5)]);
        let field = compute_distances(&occ, 2.0, 0.5).unwrap();
        // One column east: 2 km. One row south: 0.5 km.
        assert!((field.km(0, 1) - 2.0).abs() < 1e-9);
        assert!((field.km(1, 0) - 0.5).abs() < 1e-9);
        // Diagonal neighbor mixes both pitches.
        assert!((field.km(1, 1) - (4.0f64 + 0.25).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_occupancy_is_rejected() {
        let occ = occupancy_with_points(3, 3, &[]);
        assert!(matches!(
            compute_distances(&occ, 1.0, 1.0),
            Err(Error::NoReferenceFeatures)
        ));
    }

    #[test]
    fn monotone_away_from_a_single_reference() {
        let occ = occupancy_with_points(6, 6, &[(0.5, 5.5)]);
        let field = compute_distances(&occ, 1.0, 1.0).unwrap();
        for row in 0..6 {
            for col in 1..6 {
                assert!(field.km(row, col) >= field.km(row, col - 1));
            }
        }
        for col in 0..6 {
            for row in 1..6 {
                assert!(field.km(row, col) >= field.km(row - 1, col));
            }
        }
    }
}
