mod bbox;
mod boundaries;

pub use boundaries::Boundaries;
