mod cells;
mod region;
mod scope;
mod store;
mod tables;

pub use cells::{cell_records, CellRecord};
pub use region::{RegionMap, RegionRollup};
pub use scope::ScopeAccumulator;
pub use store::ResultStore;
pub use tables::{
    BandRow, CoverageGapRow, CumulativeRow, GapAnalysis, NoAccess, RegionResult, RollupAudit,
    ScopeResult, ScopeTotals,
};
