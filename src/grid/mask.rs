use geo::{BoundingRect, Contains, MultiPolygon, Point};
use ndarray::Array2;

use crate::error::{Error, Result};
use super::Grid;

impl Grid {
    /// Mask the grid against a boundary polygon: cells whose centers fall
    /// outside the polygon become no-data, and the extent is cropped to the
    /// polygon's bounding box. Fails with `NoOverlap` when the polygon and
    /// grid extents are disjoint.
    pub fn mask(&self, boundary: &MultiPolygon<f64>) -> Result<Grid> {
        let rect = boundary.bounding_rect().ok_or(Error::NoOverlap)?;
        let (gx0, gy0, gx1, gy1) = self.bounds();
        if rect.max().x < gx0 || rect.min().x > gx1 || rect.max().y < gy0 || rect.min().y > gy1 {
            return Err(Error::NoOverlap);
        }

        // Row/col window covering bbox ∩ extent.
        let t = self.transform();
        let (r0, c0) = t.cell_of(rect.min().x, rect.max().y); // top-left in a north-up grid
        let (r1, c1) = t.cell_of(rect.max().x, rect.min().y);
        let row_lo = r0.min(r1).max(0) as usize;
        let col_lo = c0.min(c1).max(0) as usize;
        let row_hi = (r0.max(r1).min(self.rows() as i64 - 1)) as usize;
        let col_hi = (c0.max(c1).min(self.cols() as i64 - 1)) as usize;
        if row_lo > row_hi || col_lo > col_hi {
            return Err(Error::NoOverlap);
        }

        let rows = row_hi - row_lo + 1;
        let cols = col_hi - col_lo + 1;
        let mut data = Array2::from_elem((rows, cols), self.nodata());
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = self.coord_of(row_lo + row, col_lo + col);
                if boundary.contains(&Point::new(x, y)) {
                    data[[row, col]] = self.value(row_lo + row, col_lo + col);
                }
            }
        }

        Grid::from_array(data, t.window(row_lo, col_lo), self.epsg(), self.nodata())
    }
}
