mod asc;
mod grid;
mod mask;
mod transform;

pub use asc::{read_asc, read_asc_with_epsg};
pub use grid::Grid;
pub use transform::GridTransform;

pub(crate) use asc::parse_prj as parse_prj_text;
pub(crate) use grid::is_geographic;
