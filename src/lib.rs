#![doc = "ReachGrid public API"]
mod aggregate;
mod boundary;
mod classify;
mod common;
mod error;
mod features;
mod grid;
mod pipeline;
mod raster;

pub mod io;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use grid::{read_asc, read_asc_with_epsg, Grid, GridTransform};

#[doc(inline)]
pub use features::{read_shapefile, AttrValue, Feature, FeatureSet};

#[doc(inline)]
pub use raster::{compute_distances, rasterize, DistanceField, OccupancyGrid};

#[doc(inline)]
pub use classify::{Class, ClassPolicy, DistanceBands, DEFAULT_URBAN_DENSITY};

#[doc(inline)]
pub use aggregate::{
    cell_records, BandRow, CellRecord, CoverageGapRow, CumulativeRow, GapAnalysis, NoAccess,
    RegionMap, RegionResult, RegionRollup, ResultStore, RollupAudit, ScopeAccumulator,
    ScopeResult, ScopeTotals,
};

#[doc(inline)]
pub use boundary::Boundaries;

#[doc(inline)]
pub use pipeline::{
    discover_rasters, run_batch, run_countries, run_scope, run_scope_with_records,
    AnalysisConfig, BatchResult, ClassFilter, ScopeOutcome,
};
