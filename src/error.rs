use thiserror::Error;

/// Error taxonomy for the accessibility engine.
///
/// Scope-level variants (`Format`, `Crs`, `CrsMismatch`, `NoOverlap`,
/// `NoReferenceFeatures`) are caught at the per-scope boundary and recorded
/// without aborting sibling scopes. `Reconciliation` and `Config` indicate a
/// logic or configuration defect and abort the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// The raster or vector source could not be parsed.
    #[error("malformed source: {0}")]
    Format(String),

    /// No coordinate reference could be determined for a source.
    #[error("no coordinate reference could be determined: {0}")]
    Crs(String),

    /// Features and grid disagree on coordinate reference; the caller must
    /// reproject before rasterizing.
    #[error("coordinate reference mismatch: features are EPSG:{features} but grid is EPSG:{grid}")]
    CrsMismatch { features: u32, grid: u32 },

    /// Boundary polygon and grid extent do not intersect at all.
    #[error("boundary polygon does not overlap the grid extent")]
    NoOverlap,

    /// The occupancy grid is entirely empty, so every distance would be
    /// undefined. Indicates missing input rather than legitimate sparse data.
    #[error("occupancy grid has no occupied cells to measure distances against")]
    NoReferenceFeatures,

    /// An aggregate invariant (partition sums, share totals, monotonicity)
    /// failed after rollup.
    #[error("aggregate reconciliation failed: {0}")]
    Reconciliation(String),

    /// Invalid analysis configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
