//! Feature rasterization into a binary occupancy grid.

use geo::{BoundingRect, CoordsIter, Geometry, LineString, Polygon};
use ndarray::Array2;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::features::FeatureSet;
use crate::grid::{Grid, GridTransform};

/// A binary grid congruent to a reference [`Grid`], marking cells that
/// contain at least one feature.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    data: Array2<bool>,
    transform: GridTransform,
    epsg: u32,
}

impl OccupancyGrid {
    #[inline] pub fn rows(&self) -> usize { self.data.nrows() }
    #[inline] pub fn cols(&self) -> usize { self.data.ncols() }
    #[inline] pub fn shape(&self) -> (usize, usize) { self.data.dim() }
    #[inline] pub fn transform(&self) -> &GridTransform { &self.transform }
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }
    #[inline] pub fn data(&self) -> &Array2<bool> { &self.data }

    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.data[[row, col]]
    }

    pub fn occupied_count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// Same shape and pixel geometry as the reference grid.
    pub fn congruent_with(&self, grid: &Grid) -> bool {
        self.shape() == grid.shape() && self.transform == *grid.transform()
    }
}

/// Rasterize a feature collection onto the pixel geometry of a reference
/// grid. Points mark their containing cell, lines every cell they cross,
/// polygons their boundary and covered interior. Duplicate and overlapping
/// geometries collapse to the same occupied cells; geometry outside the
/// extent contributes nothing.
pub fn rasterize(features: &FeatureSet, grid: &Grid) -> Result<OccupancyGrid> {
    if features.epsg() != grid.epsg() {
        return Err(Error::CrsMismatch { features: features.epsg(), grid: grid.epsg() });
    }

    let mut burner = Burner {
        data: Array2::from_elem(grid.shape(), false),
        transform: *grid.transform(),
    };
    for feature in features.iter() {
        if feature.geometry.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(Error::Format("feature geometry has a non-finite coordinate".into()));
        }
        burner.burn_geometry(&feature.geometry);
    }

    Ok(OccupancyGrid {
        data: burner.data,
        transform: *grid.transform(),
        epsg: grid.epsg(),
    })
}

struct Burner {
    data: Array2<bool>,
    transform: GridTransform,
}

impl Burner {
    fn burn_geometry(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.burn_point(p.x(), p.y()),
            Geometry::MultiPoint(mp) => {
                for p in &mp.0 {
                    self.burn_point(p.x(), p.y());
                }
            }
            Geometry::Line(line) => {
                self.burn_segment((line.start.x, line.start.y), (line.end.x, line.end.y));
            }
            Geometry::LineString(ls) => self.burn_line_string(ls),
            Geometry::MultiLineString(mls) => {
                for ls in &mls.0 {
                    self.burn_line_string(ls);
                }
            }
            Geometry::Polygon(polygon) => self.burn_polygon(polygon),
            Geometry::MultiPolygon(mp) => {
                for polygon in &mp.0 {
                    self.burn_polygon(polygon);
                }
            }
            Geometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    self.burn_geometry(g);
                }
            }
            Geometry::Rect(rect) => self.burn_polygon(&rect.to_polygon()),
            Geometry::Triangle(tri) => self.burn_polygon(&tri.to_polygon()),
        }
    }

    #[inline]
    fn mark(&mut self, row: i64, col: i64) {
        if row >= 0 && col >= 0 && (row as usize) < self.data.nrows() && (col as usize) < self.data.ncols() {
            self.data[[row as usize, col as usize]] = true;
        }
    }

    fn burn_point(&mut self, x: f64, y: f64) {
        let (row, col) = self.transform.cell_of(x, y);
        self.mark(row, col);
    }

    fn burn_line_string(&mut self, ls: &LineString<f64>) {
        for pair in ls.0.windows(2) {
            self.burn_segment((pair[0].x, pair[0].y), (pair[1].x, pair[1].y));
        }
    }

    /// Walk every cell a segment passes through (grid traversal in
    /// fractional pixel space). Cells outside the extent are skipped but
    /// the walk continues, so partially covering segments still burn.
    fn burn_segment(&mut self, start: (f64, f64), end: (f64, f64)) {
        let (fr0, fc0) = self.transform.frac_cell_of(start.0, start.1);
        let (fr1, fc1) = self.transform.frac_cell_of(end.0, end.1);

        let (mut row, mut col) = (fr0.floor() as i64, fc0.floor() as i64);
        let (end_row, end_col) = (fr1.floor() as i64, fc1.floor() as i64);
        let (dr, dc) = (fr1 - fr0, fc1 - fc0);

        let step_row: i64 = if dr > 0.0 { 1 } else { -1 };
        let step_col: i64 = if dc > 0.0 { 1 } else { -1 };
        let t_delta_row = if dr != 0.0 { (1.0 / dr).abs() } else { f64::INFINITY };
        let t_delta_col = if dc != 0.0 { (1.0 / dc).abs() } else { f64::INFINITY };
        let mut t_max_row = if dr > 0.0 {
            ((row + 1) as f64 - fr0) / dr
        } else if dr < 0.0 {
            (row as f64 - fr0) / dr
        } else {
            f64::INFINITY
        };
        let mut t_max_col = if dc > 0.0 {
            ((col + 1) as f64 - fc0) / dc
        } else if dc < 0.0 {
            (col as f64 - fc0) / dc
        } else {
            f64::INFINITY
        };

        self.mark(row, col);
        let steps = (end_row - row).abs() + (end_col - col).abs();
        for _ in 0..steps {
            if t_max_row < t_max_col {
                row += step_row;
                t_max_row += t_delta_row;
            } else {
                col += step_col;
                t_max_col += t_delta_col;
            }
            self.mark(row, col);
        }
    }

    /// Boundary cells via segment walks, covered cells via an even-odd
    /// scanline over row centers.
    fn burn_polygon(&mut self, polygon: &Polygon<f64>) {
        self.burn_line_string(polygon.exterior());
        for ring in polygon.interiors() {
            self.burn_line_string(ring);
        }

        let Some(rect) = polygon.bounding_rect() else { return };
        let rows = self.data.nrows() as i64;
        let cols = self.data.ncols() as i64;

        // Row window covered by the polygon's bbox.
        let (fr_top, _) = self.transform.frac_cell_of(rect.min().x, rect.max().y);
        let (fr_bot, _) = self.transform.frac_cell_of(rect.min().x, rect.min().y);
        let row_lo = fr_top.min(fr_bot).floor().max(0.0) as i64;
        let row_hi = (fr_top.max(fr_bot).floor() as i64).min(rows - 1);

        for row in row_lo..=row_hi {
            let (_, y) = self.transform.coord_of(row as usize, 0);

            let mut crossings: SmallVec<[f64; 8]> = SmallVec::new();
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                for pair in ring.0.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if (a.y > y) != (b.y > y) {
                        crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let (fc0, fc1) = (
                    self.transform.frac_cell_of(span[0], y).1 - 0.5,
                    self.transform.frac_cell_of(span[1], y).1 - 0.5,
                );
                let col_lo = fc0.min(fc1).ceil().max(0.0) as i64;
                let col_hi = (fc0.max(fc1).floor() as i64).min(cols - 1);
                for col in col_lo..=col_hi {
                    self.mark(row, col);
                }
            }
        }
    }
}
