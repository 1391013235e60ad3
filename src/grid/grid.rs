use ndarray::Array2;

use crate::error::{Error, Result};
use super::GridTransform;

/// Great-circle kilometers per degree at the equator, used to scale
/// geographic cell sizes into physical distance units.
pub(crate) const KM_PER_DEGREE: f64 = 111.32;

/// Geographic (lon/lat) EPSG codes the engine recognizes.
#[inline]
pub(crate) fn is_geographic(epsg: u32) -> bool {
    matches!(epsg, 4326 | 4269 | 4258 | 4937)
}

/// A single-band raster: cell values, affine pixel geometry, coordinate
/// reference, and a no-data sentinel. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Grid {
    data: Array2<f64>,
    transform: GridTransform,
    epsg: u32,
    nodata: f64,
}

impl Grid {
    /// Wrap an in-memory array. Every value must be finite, the no-data
    /// sentinel, or NaN (treated as no-data).
    pub fn from_array(data: Array2<f64>, transform: GridTransform, epsg: u32, nodata: f64) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::Format("grid has an empty extent".into()));
        }
        if data.iter().any(|v| v.is_infinite()) {
            return Err(Error::Format("grid contains non-finite values".into()));
        }
        Ok(Self { data, transform, epsg, nodata })
    }

    #[inline] pub fn rows(&self) -> usize { self.data.nrows() }
    #[inline] pub fn cols(&self) -> usize { self.data.ncols() }
    #[inline] pub fn shape(&self) -> (usize, usize) { self.data.dim() }
    #[inline] pub fn transform(&self) -> &GridTransform { &self.transform }
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }
    #[inline] pub fn nodata(&self) -> f64 { self.nodata }
    #[inline] pub fn data(&self) -> &Array2<f64> { &self.data }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Whether a value is the no-data sentinel.
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Cell containing a world coordinate, or None when outside the extent.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (row, col) = self.transform.cell_of(x, y);
        if row < 0 || col < 0 || row as usize >= self.rows() || col as usize >= self.cols() {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// World coordinates of a cell center.
    #[inline]
    pub fn coord_of(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.coord_of(row, col)
    }

    /// Outer bounds of the grid: (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.rows(), self.cols())
    }

    /// Cell sizes in kilometers along x and y. Geographic grids scale
    /// degrees by the equatorial constant; projected grids are assumed
    /// metric.
    pub fn cell_size_km(&self) -> (f64, f64) {
        let (dx, dy) = (self.transform.dx().abs(), self.transform.dy().abs());
        if is_geographic(self.epsg) {
            (dx * KM_PER_DEGREE, dy * KM_PER_DEGREE)
        } else {
            (dx / 1000.0, dy / 1000.0)
        }
    }

    /// Total of all populated (non-no-data, non-zero) cell values.
    pub fn populated_total(&self) -> f64 {
        self.data.iter()
            .filter(|v| !self.is_nodata(**v) && **v != 0.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn transform() -> GridTransform {
        GridTransform::north_up(0.0, 2.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn cell_of_rejects_outside_points() {
        let grid = Grid::from_array(array![[1.0, 2.0], [3.0, 4.0]], transform(), 32633, -9999.0).unwrap();
        assert_eq!(grid.cell_of(0.5, 1.5), Some((0, 0)));
        assert_eq!(grid.cell_of(1.5, 0.5), Some((1, 1)));
        assert_eq!(grid.cell_of(-0.5, 1.5), None);
        assert_eq!(grid.cell_of(0.5, 2.5), None);
    }

    #[test]
    fn nodata_and_nan_are_equivalent() {
        let grid = Grid::from_array(array![[-9999.0, f64::NAN], [3.0, 0.0]], transform(), 4326, -9999.0).unwrap();
        assert!(grid.is_nodata(grid.value(0, 0)));
        assert!(grid.is_nodata(grid.value(0, 1)));
        assert!(!grid.is_nodata(grid.value(1, 0)));
        assert_eq!(grid.populated_total(), 3.0);
    }

    #[test]
    fn infinite_values_are_rejected() {
        let err = Grid::from_array(array![[f64::INFINITY]], transform(), 4326, -9999.0);
        assert!(err.is_err());
    }

    #[test]
    fn cell_sizes_scale_by_crs() {
        let geo = Grid::from_array(array![[1.0]], GridTransform::north_up(0.0, 1.0, 0.5, 0.5).unwrap(), 4326, -9999.0).unwrap();
        let (cx, _) = geo.cell_size_km();
        assert!((cx - 0.5 * KM_PER_DEGREE).abs() < 1e-9);

        let utm = Grid::from_array(array![[1.0]], GridTransform::north_up(0.0, 1000.0, 1000.0, 1000.0).unwrap(), 32633, -9999.0).unwrap();
        assert_eq!(utm.cell_size_km(), (1.0, 1.0));
    }
}
