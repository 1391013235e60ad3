use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{Error, Result};
use crate::grid::is_geographic;
use super::{Feature, FeatureSet};

/// Build the PROJ.4 string for a supported EPSG code.
fn proj4_string(epsg: u32) -> Result<String> {
    let s = match epsg {
        4326 => "+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string(),
        4269 | 4937 => "+proj=longlat +datum=NAD83 +no_defs +type=crs".to_string(),
        3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
                 +units=m +nadgrids=@null +no_defs +type=crs".to_string(),
        // WGS84 UTM: 326zz north, 327zz south
        32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs +type=crs", epsg - 32600),
        32701..=32760 => format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs +type=crs", epsg - 32700),
        other => return Err(Error::Crs(format!("unsupported EPSG code {other}"))),
    };
    Ok(s)
}

impl FeatureSet {
    /// Reproject every geometry into `target` and return a new FeatureSet
    /// declaring that CRS. A no-op when the set already matches.
    pub fn reproject_to(&self, target: u32) -> Result<FeatureSet> {
        let source = self.epsg();
        if source == target {
            return Ok(FeatureSet::new(self.features().to_vec(), Some(target)));
        }

        let from = {
            let proj_string = proj4_string(source)?;
            Proj4::from_proj_string(&proj_string)
                .map_err(|e| Error::Crs(format!("failed to build source PROJ.4 for EPSG:{source}: {e}")))?
        };
        let to = {
            let proj_string = proj4_string(target)?;
            Proj4::from_proj_string(&proj_string)
                .map_err(|e| Error::Crs(format!("failed to build target PROJ.4 for EPSG:{target}: {e}")))?
        };
        let (src_geog, dst_geog) = (is_geographic(source), is_geographic(target));

        let features = self.iter()
            .map(|f| {
                let geometry = f.geometry.map_coords(|coord: Coord<f64>| {
                    // proj4rs works in radians for geographic CRSs.
                    let (x, y) = if src_geog {
                        (coord.x.to_radians(), coord.y.to_radians())
                    } else {
                        (coord.x, coord.y)
                    };
                    let mut point = (x, y, 0.0);
                    transform(&from, &to, &mut point)
                        .expect("CRS transform failed");
                    if dst_geog {
                        Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
                    } else {
                        Coord { x: point.0, y: point.1 }
                    }
                });
                Feature { geometry, attrs: f.attrs.clone() }
            })
            .collect();

        Ok(FeatureSet::new(features, Some(target)))
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};

    use super::*;

    #[test]
    fn same_crs_is_a_passthrough() {
        let set = FeatureSet::new(vec![Feature::new(Point::new(12.5, 41.9).into())], Some(4326));
        let out = set.reproject_to(4326).unwrap();
        assert_eq!(out.declared_epsg(), Some(4326));
        match &out.features()[0].geometry {
            Geometry::Point(p) => assert_eq!((p.x(), p.y()), (12.5, 41.9)),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn lonlat_to_web_mercator_lands_near_known_values() {
        let set = FeatureSet::new(vec![Feature::new(Point::new(0.0, 0.0).into())], Some(4326));
        let out = set.reproject_to(3857).unwrap();
        match &out.features()[0].geometry {
            Geometry::Point(p) => {
                assert!(p.x().abs() < 1e-6);
                assert!(p.y().abs() < 1e-6);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn utm_round_trip_preserves_coordinates() {
        // Zone 33N covers 12°E..18°E.
        let set = FeatureSet::new(vec![Feature::new(Point::new(15.0, 45.0).into())], Some(4326));
        let utm = set.reproject_to(32633).unwrap();
        let back = utm.reproject_to(4326).unwrap();
        match &back.features()[0].geometry {
            Geometry::Point(p) => {
                assert!((p.x() - 15.0).abs() < 1e-6);
                assert!((p.y() - 45.0).abs() < 1e-6);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn unsupported_crs_is_an_error() {
        let set = FeatureSet::new(vec![Feature::new(Point::new(0.0, 0.0).into())], Some(4326));
        assert!(matches!(set.reproject_to(27700), Err(Error::Crs(_))));
    }
}
