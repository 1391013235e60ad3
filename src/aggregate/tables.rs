//! Serialized shapes of the aggregate outputs.

use serde::{Deserialize, Serialize};

/// Total population of a scope, split by class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeTotals {
    pub population: f64,
    pub urban: f64,
    pub rural: f64,
    /// Number of populated grid cells that contributed.
    pub cells: u64,
}

/// One discrete distance band (non-cumulative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRow {
    pub label: String,
    pub low_km: f64,
    /// None for the unbounded final band.
    pub high_km: Option<f64>,
    pub population: f64,
    pub urban: f64,
    pub rural: f64,
    pub cells: u64,
}

/// Population without access at a given threshold. The urban/rural split is
/// reported only when both class totals are independently known; it is
/// never assumed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoAccess {
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urban: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural: Option<f64>,
}

/// One row of the cumulative-threshold table: population reachable within
/// `threshold_km` of a reference feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeRow {
    pub threshold_km: f64,
    pub urban: f64,
    pub rural: f64,
    pub total: f64,
    pub urban_share: f64,
    pub rural_share: f64,
    pub total_share: f64,
    pub no_access: NoAccess,
}

/// Urban/rural accessibility gap at one threshold, in coverage percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGapRow {
    pub threshold_km: f64,
    pub urban_pct: f64,
    pub rural_pct: f64,
    pub gap_pct: f64,
}

/// Population-weighted accessibility gap between the classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub urban_mean_km: f64,
    pub rural_mean_km: f64,
    /// rural mean minus urban mean.
    pub mean_gap_km: f64,
    pub coverage: Vec<CoverageGapRow>,
}

/// The aggregate output of one analysis scope (one country). Written once,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeResult {
    pub scope: String,
    pub totals: ScopeTotals,
    pub bands: Vec<BandRow>,
    pub cumulative: Vec<CumulativeRow>,
    /// Present only when both classes are populated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<GapAnalysis>,
}

/// A region-level rollup: the same table shapes, summed over the member
/// scopes that were actually present in the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub region: String,
    pub members: Vec<String>,
    pub totals: ScopeTotals,
    pub bands: Vec<BandRow>,
    pub cumulative: Vec<CumulativeRow>,
}

/// Countries that could not be rolled up, reported instead of being
/// silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupAudit {
    /// Scopes present in the data but assigned to no region.
    pub unmapped: Vec<String>,
    /// Configured region members absent from the data, as (region, member).
    pub missing: Vec<(String, String)>,
}

impl RollupAudit {
    pub fn is_clean(&self) -> bool {
        self.unmapped.is_empty() && self.missing.is_empty()
    }
}
