//! Shapefile feature loading.

use std::path::Path;

use ahash::AHashMap;
use shapefile as shp;

use crate::common::{shp_point_to_geo, shp_polygon_to_geo, shp_polyline_to_geo};
use crate::error::{Error, Result};
use super::{AttrValue, Feature, FeatureSet};

/// Read a shapefile into a FeatureSet, carrying every dBase attribute.
/// The coordinate reference is taken from the sidecar `.prj` when present;
/// otherwise it stays undeclared (assumed WGS84 downstream).
pub fn read_shapefile(path: &Path) -> Result<FeatureSet> {
    let epsg = sidecar_epsg(path);
    let mut reader = shp::Reader::from_path(path)
        .map_err(|e| Error::Format(format!("{}: {e}", path.display())))?;

    let mut features = Vec::new();
    for pair in reader.iter_shapes_and_records() {
        let (shape, record) = pair
            .map_err(|e| Error::Format(format!("{}: {e}", path.display())))?;
        let Some(geometry) = shape_to_geometry(shape) else { continue };
        features.push(Feature { geometry, attrs: record_attrs(record) });
    }

    log::info!("loaded {} features from {}", features.len(), path.display());
    Ok(FeatureSet::new(features, epsg))
}

fn shape_to_geometry(shape: shp::Shape) -> Option<geo::Geometry<f64>> {
    match shape {
        shp::Shape::Point(p) => Some(shp_point_to_geo(&p).into()),
        shp::Shape::Multipoint(mp) => Some(geo::MultiPoint(
            mp.points().iter().map(shp_point_to_geo).collect()
        ).into()),
        shp::Shape::Polyline(line) => Some(shp_polyline_to_geo(&line).into()),
        shp::Shape::Polygon(polygon) => Some(shp_polygon_to_geo(&polygon).into()),
        // Z/M variants and null shapes carry nothing we aggregate over.
        _ => None,
    }
}

fn record_attrs(record: shp::dbase::Record) -> AHashMap<String, AttrValue> {
    let mut attrs = AHashMap::new();
    for (name, value) in record {
        let value = match value {
            shp::dbase::FieldValue::Character(Some(s)) => AttrValue::Text(s),
            shp::dbase::FieldValue::Numeric(Some(n)) => AttrValue::Number(n),
            shp::dbase::FieldValue::Float(Some(f)) => AttrValue::Number(f as f64),
            shp::dbase::FieldValue::Integer(i) => AttrValue::Number(i as f64),
            shp::dbase::FieldValue::Double(d) => AttrValue::Number(d),
            shp::dbase::FieldValue::Currency(c) => AttrValue::Number(c),
            shp::dbase::FieldValue::Logical(Some(b)) => AttrValue::Bool(b),
            _ => continue,
        };
        attrs.insert(name, value);
    }
    attrs
}

fn sidecar_epsg(path: &Path) -> Option<u32> {
    let prj = path.with_extension("prj");
    let text = std::fs::read_to_string(prj).ok()?;
    crate::grid::parse_prj_text(&text)
}
