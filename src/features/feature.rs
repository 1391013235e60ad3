use ahash::AHashMap;
use geo::{BoundingRect, Geometry, Rect};

/// A single attribute value carried by a vector feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl AttrValue {
    /// Loose equality used by class filters: numeric strings match numbers.
    pub(crate) fn matches(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            (AttrValue::Text(a), AttrValue::Number(b)) => a.parse::<f64>().is_ok_and(|v| v == *b),
            (AttrValue::Number(a), AttrValue::Text(b)) => b.parse::<f64>().is_ok_and(|v| v == *a),
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self { AttrValue::Number(v) }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self { AttrValue::Text(v.to_string()) }
}

/// One vector feature: a geometry plus its attribute mapping.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attrs: AHashMap<String, AttrValue>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self { geometry, attrs: AHashMap::new() }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }
}

/// An ordered, read-only collection of vector features sharing one
/// coordinate reference. `epsg == None` means the source declared nothing
/// and WGS84 is assumed.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    features: Vec<Feature>,
    epsg: Option<u32>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>, epsg: Option<u32>) -> Self {
        Self { features, epsg }
    }

    #[inline] pub fn len(&self) -> usize { self.features.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }
    #[inline] pub fn features(&self) -> &[Feature] { &self.features }
    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Feature> { self.features.iter() }

    /// Declared EPSG code, if any.
    #[inline] pub fn declared_epsg(&self) -> Option<u32> { self.epsg }

    /// EPSG code with the raw-input default applied (WGS84).
    #[inline] pub fn epsg(&self) -> u32 { self.epsg.unwrap_or(4326) }

    /// Keep only features whose `field` attribute matches one of `allowed`
    /// (e.g. road class 1 or 2). Features lacking the field are dropped.
    pub fn filter_by(&self, field: &str, allowed: &[AttrValue]) -> FeatureSet {
        let features = self.features.iter()
            .filter(|f| f.attrs.get(field)
                .is_some_and(|v| allowed.iter().any(|a| a.matches(v))))
            .cloned()
            .collect();
        FeatureSet { features, epsg: self.epsg }
    }

    /// Keep only features whose bounding box intersects `window`.
    pub fn clip_to(&self, window: &Rect<f64>) -> FeatureSet {
        let features = self.features.iter()
            .filter(|f| f.geometry.bounding_rect().is_some_and(|b| {
                b.min().x <= window.max().x && b.max().x >= window.min().x
                    && b.min().y <= window.max().y && b.max().y >= window.min().y
            }))
            .cloned()
            .collect();
        FeatureSet { features, epsg: self.epsg }
    }
}
