//! Region-level rollups of per-country results.

use ahash::AHashMap;

use crate::error::{Error, Result};
use super::tables::{
    BandRow, CumulativeRow, NoAccess, RegionResult, RollupAudit, ScopeResult, ScopeTotals,
};

/// Assignment of countries to regions, in configured order.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: Vec<(String, Vec<String>)>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: &str, members: Vec<String>) {
        self.regions.push((region.to_string(), members));
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        Self { regions: pairs.into_iter().collect() }
    }

    #[inline] pub fn len(&self) -> usize { self.regions.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    pub fn region_of(&self, country: &str) -> Option<&str> {
        self.regions.iter()
            .find(|(_, members)| members.iter().any(|m| m == country))
            .map(|(region, _)| region.as_str())
    }

    /// Sum the member countries' tables into region tables. Countries with
    /// no mapped region and configured members absent from the data are
    /// returned in the audit, never silently dropped or assumed zero.
    pub fn rollup(&self, results: &[ScopeResult]) -> Result<RegionRollup> {
        let by_scope: AHashMap<&str, &ScopeResult> =
            results.iter().map(|r| (r.scope.as_str(), r)).collect();

        let mut audit = RollupAudit::default();
        for result in results {
            if self.region_of(&result.scope).is_none() {
                audit.unmapped.push(result.scope.clone());
            }
        }
        audit.unmapped.sort_unstable();

        let mut regions = Vec::with_capacity(self.regions.len());
        for (region, configured) in &self.regions {
            let mut present = Vec::new();
            for member in configured {
                match by_scope.get(member.as_str()) {
                    Some(result) => present.push(*result),
                    None => audit.missing.push((region.clone(), member.clone())),
                }
            }
            regions.push(sum_region(region, &present)?);
        }

        if !audit.is_clean() {
            log::warn!(
                "region rollup audit: {} unmapped countr(ies), {} missing member(s)",
                audit.unmapped.len(),
                audit.missing.len()
            );
        }

        Ok(RegionRollup { regions, audit })
    }
}

/// A completed rollup: one result per configured region plus the audit.
#[derive(Debug, Clone)]
pub struct RegionRollup {
    pub regions: Vec<RegionResult>,
    pub audit: RollupAudit,
}

fn sum_region(region: &str, members: &[&ScopeResult]) -> Result<RegionResult> {
    let mut totals = ScopeTotals { population: 0.0, urban: 0.0, rural: 0.0, cells: 0 };
    let mut bands: Vec<BandRow> = Vec::new();
    let mut cumulative: Vec<CumulativeRow> = Vec::new();

    for (i, member) in members.iter().enumerate() {
        totals.population += member.totals.population;
        totals.urban += member.totals.urban;
        totals.rural += member.totals.rural;
        totals.cells += member.totals.cells;

        if i == 0 {
            bands = member.bands.clone();
            cumulative = member.cumulative.clone();
            continue;
        }

        if bands.len() != member.bands.len()
            || bands.iter().zip(&member.bands).any(|(a, b)| a.label != b.label)
        {
            return Err(Error::Config(format!(
                "scope {} uses a different band layout than its region {region}",
                member.scope
            )));
        }
        if cumulative.len() != member.cumulative.len()
            || cumulative.iter().zip(&member.cumulative).any(|(a, b)| a.threshold_km != b.threshold_km)
        {
            return Err(Error::Config(format!(
                "scope {} uses different cumulative thresholds than its region {region}",
                member.scope
            )));
        }

        for (row, other) in bands.iter_mut().zip(&member.bands) {
            row.population += other.population;
            row.urban += other.urban;
            row.rural += other.rural;
            row.cells += other.cells;
        }
        for (row, other) in cumulative.iter_mut().zip(&member.cumulative) {
            row.urban += other.urban;
            row.rural += other.rural;
            row.total += other.total;
            // The split stays reported only while every member reports it.
            row.no_access.total += other.no_access.total;
            row.no_access.urban = sum_opt(row.no_access.urban, other.no_access.urban);
            row.no_access.rural = sum_opt(row.no_access.rural, other.no_access.rural);
        }
    }

    // Shares are relative to the region total, not an average of members.
    for row in &mut cumulative {
        row.urban_share = share(row.urban, totals.population);
        row.rural_share = share(row.rural, totals.population);
        row.total_share = share(row.total, totals.population);
    }

    Ok(RegionResult {
        region: region.to_string(),
        members: members.iter().map(|m| m.scope.clone()).collect(),
        totals,
        bands,
        cumulative,
    })
}

#[inline]
fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

#[inline]
fn sum_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    }
}
