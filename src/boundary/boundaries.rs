use std::path::Path;

use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTree, AABB};

use crate::error::{Error, Result};
use crate::features::{read_shapefile, AttrValue, FeatureSet};
use crate::grid::Grid;
use super::bbox::BoundingBox;

/// Named administrative boundary polygons with a spatial index, used to
/// scope a continental grid into per-country analysis grids.
#[derive(Debug, Clone)]
pub struct Boundaries {
    names: Vec<String>,
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    epsg: u32,
}

impl Boundaries {
    /// Build from parallel name/polygon lists sharing one CRS.
    pub fn new(entries: Vec<(String, MultiPolygon<f64>)>, epsg: u32) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Format("boundary set is empty".into()));
        }
        let (names, shapes): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let rtree = RTree::bulk_load(
            shapes.iter().enumerate()
                .filter_map(|(i, polygon)| polygon.bounding_rect().map(|r| BoundingBox::new(i, r)))
                .collect()
        );
        Ok(Self { names, shapes, rtree, epsg })
    }

    /// Load country boundaries from a shapefile, naming each polygon by the
    /// given attribute field (e.g. "NAME_0").
    pub fn from_shapefile(path: &Path, name_field: &str) -> Result<Self> {
        let features = read_shapefile(path)?;
        let epsg = features.epsg();

        let mut entries = Vec::new();
        for feature in features.iter() {
            let geo::Geometry::MultiPolygon(mp) = &feature.geometry else { continue };
            let name = match feature.attrs.get(name_field) {
                Some(AttrValue::Text(name)) => name.clone(),
                Some(AttrValue::Number(n)) => n.to_string(),
                _ => {
                    return Err(Error::Format(format!(
                        "boundary feature lacks a {name_field:?} attribute"
                    )))
                }
            };
            entries.push((name, mp.clone()));
        }
        Self::new(entries, epsg)
    }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MultiPolygon<f64>)> {
        self.names.iter().map(|n| n.as_str()).zip(self.shapes.iter())
    }

    pub fn get(&self, name: &str) -> Option<&MultiPolygon<f64>> {
        self.names.iter().position(|n| n == name).map(|i| &self.shapes[i])
    }

    /// Names of boundaries whose bounding boxes intersect a window.
    pub fn query(&self, window: &Rect<f64>) -> Vec<&str> {
        let envelope = AABB::from_corners(window.min().into(), window.max().into());
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|b| b.idx())
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| self.names[i].as_str()).collect()
    }

    /// Scope the analysis grid to one country: mask and crop against its
    /// boundary. Fails with `NoOverlap` when the country lies outside the
    /// grid.
    pub fn scope_grid(&self, grid: &Grid, name: &str) -> Result<Grid> {
        let boundary = self.get(name)
            .ok_or_else(|| Error::Format(format!("unknown boundary {name:?}")))?;
        grid.mask(boundary)
    }

    /// Pre-filter features to a country's bounding envelope before
    /// rasterization.
    pub fn clip_features(&self, features: &FeatureSet, name: &str) -> Result<FeatureSet> {
        let boundary = self.get(name)
            .ok_or_else(|| Error::Format(format!("unknown boundary {name:?}")))?;
        let rect = boundary.bounding_rect()
            .ok_or_else(|| Error::Format(format!("boundary {name:?} has no extent")))?;
        Ok(features.clip_to(&rect))
    }
}
