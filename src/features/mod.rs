mod feature;
mod proj;
mod read;

pub use feature::{AttrValue, Feature, FeatureSet};
pub use read::read_shapefile;
