use shapefile as shp;

/// Convert a shapefile::Point to geo::Point<f64>
#[inline]
pub(crate) fn shp_point_to_geo(p: &shp::Point) -> geo::Point<f64> {
    geo::Point::new(p.x, p.y)
}

/// Convert shapefile::Polyline to geo::MultiLineString<f64>
pub(crate) fn shp_polyline_to_geo(line: &shp::Polyline) -> geo::MultiLineString<f64> {
    let parts = line.parts().iter()
        .map(|part| geo::LineString(
            part.iter().map(|pt| geo::Coord { x: pt.x, y: pt.y }).collect()
        ))
        .collect();
    geo::MultiLineString(parts)
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_polygon_to_geo(p: &shp::Polygon) -> geo::MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0])
        }
    }

    /// Get the signed area of a geo::Coord list (negative for hole)
    fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
        let mut a = 0.0;
        for w in pts.windows(2) {
            a += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        a / 2.0
    }

    // 1) Convert each ring into a LineString (ensure closed)
    let mut ls_rings: Vec<(geo::LineString<f64>, bool /*is_exterior*/)> = Vec::with_capacity(p.rings().len());
    for ring in p.rings().iter() {
        let mut coords: Vec<geo::Coord<f64>> = ring.points().iter().map(|pt| geo::Coord { x: pt.x, y: pt.y }).collect();
        ensure_closed(&mut coords);
        let ls = geo::LineString(coords);
        // Shapefile stores exteriors clockwise, so infer by orientation.
        let is_exterior = signed_area(&ls.0) < 0.0;
        ls_rings.push((ls, is_exterior));
    }

    // 2) Group: each exterior with its following holes (Shapefile stores rings in this order)
    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<geo::LineString<f64>> = None;
    let mut current_holes: Vec<geo::LineString<f64>> = Vec::new();

    for (ls, is_exterior) in ls_rings {
        if is_exterior {
            // flush previous polygon
            if let Some(ext) = current_exterior.take() {
                polys.push(geo::Polygon::new(ext, current_holes));
                current_holes = Vec::new();
            }
            current_exterior = Some(ls);
        } else {
            current_holes.push(ls);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(geo::Polygon::new(ext, current_holes));
    }

    geo::MultiPolygon(polys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile as shp;

    #[test]
    fn polyline_parts_become_line_strings() {
        let line = shp::Polyline::with_parts(vec![
            vec![shp::Point::new(0.0, 0.0), shp::Point::new(2.0, 0.0)],
            vec![shp::Point::new(0.0, 1.0), shp::Point::new(2.0, 1.0), shp::Point::new(2.0, 2.0)],
        ]);
        let mls = shp_polyline_to_geo(&line);
        assert_eq!(mls.0.len(), 2);
        assert_eq!(mls.0[0].0.len(), 2);
        assert_eq!(mls.0[1].0.len(), 3);
        assert_eq!(mls.0[1].0[2], geo::Coord { x: 2.0, y: 2.0 });
    }

    #[test]
    fn clockwise_ring_becomes_exterior() {
        let ring = vec![
            shp::Point::new(0.0, 0.0),
            shp::Point::new(0.0, 2.0),
            shp::Point::new(2.0, 2.0),
            shp::Point::new(2.0, 0.0),
            shp::Point::new(0.0, 0.0),
        ];
        let polygon = shp::Polygon::with_rings(vec![shp::PolygonRing::Outer(ring)]);
        let mp = shp_polygon_to_geo(&polygon);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].exterior().0.len(), 5);
        assert!(mp.0[0].interiors().is_empty());
    }
}
