//! Per-scope accumulation and reconciliation.

use crate::classify::{Class, DistanceBands};
use crate::error::{Error, Result};
use super::cells::CellRecord;
use super::tables::{
    BandRow, CoverageGapRow, CumulativeRow, GapAnalysis, NoAccess, ScopeResult, ScopeTotals,
};

/// Tolerance for share-sum checks on complete partitions.
const SHARE_EPS: f64 = 1e-3;

/// Accumulates Cell Records for one scope into its aggregate tables.
///
/// Band sums, cumulative buckets, and scope totals are accumulated
/// independently so that [`finish`](Self::finish) can verify they
/// reconcile; a mismatch indicates a logic defect and surfaces as
/// `Error::Reconciliation` rather than being swallowed.
#[derive(Debug)]
pub struct ScopeAccumulator {
    bands: DistanceBands,
    thresholds: Vec<f64>,

    band_urban: Vec<f64>,
    band_rural: Vec<f64>,
    band_cells: Vec<u64>,
    // Population bucketed by the first threshold that reaches it; the extra
    // slot collects cells beyond every threshold.
    first_urban: Vec<f64>,
    first_rural: Vec<f64>,

    total: f64,
    urban: f64,
    rural: f64,
    cells: u64,
    urban_wdist: f64,
    rural_wdist: f64,
}

impl ScopeAccumulator {
    pub fn new(bands: DistanceBands, thresholds: Vec<f64>) -> Result<Self> {
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config("cumulative thresholds must be strictly ascending".into()));
        }
        if thresholds.first().is_some_and(|t| *t <= 0.0) {
            return Err(Error::Config("cumulative thresholds must be positive".into()));
        }
        let n_bands = bands.len();
        let n_thresholds = thresholds.len();
        Ok(Self {
            bands,
            thresholds,
            band_urban: vec![0.0; n_bands],
            band_rural: vec![0.0; n_bands],
            band_cells: vec![0; n_bands],
            first_urban: vec![0.0; n_thresholds + 1],
            first_rural: vec![0.0; n_thresholds + 1],
            total: 0.0,
            urban: 0.0,
            rural: 0.0,
            cells: 0,
            urban_wdist: 0.0,
            rural_wdist: 0.0,
        })
    }

    pub fn push(&mut self, record: &CellRecord) {
        let pop = record.population;
        let slot = self.thresholds.partition_point(|t| *t < record.distance_km);

        self.total += pop;
        self.cells += 1;
        self.band_cells[record.band] += 1;
        match record.class {
            Class::Urban => {
                self.urban += pop;
                self.urban_wdist += pop * record.distance_km;
                self.band_urban[record.band] += pop;
                self.first_urban[slot] += pop;
            }
            Class::Rural => {
                self.rural += pop;
                self.rural_wdist += pop * record.distance_km;
                self.band_rural[record.band] += pop;
                self.first_rural[slot] += pop;
            }
        }
    }

    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a CellRecord>) {
        for record in records {
            self.push(record);
        }
    }

    /// Close the accumulation and produce the scope's tables, verifying the
    /// reconciliation invariants.
    pub fn finish(self, scope: &str) -> Result<ScopeResult> {
        let tol = 1e-6 * self.total.abs().max(1.0);

        let mut bands = Vec::with_capacity(self.bands.len());
        let (mut pop_sum, mut urban_sum, mut rural_sum) = (0.0, 0.0, 0.0);
        for band in 0..self.bands.len() {
            let (low_km, high_km) = self.bands.bounds(band);
            let (urban, rural) = (self.band_urban[band], self.band_rural[band]);
            pop_sum += urban + rural;
            urban_sum += urban;
            rural_sum += rural;
            bands.push(BandRow {
                label: self.bands.label(band),
                low_km,
                high_km,
                population: urban + rural,
                urban,
                rural,
                cells: self.band_cells[band],
            });
        }

        reconcile(scope, "band urban sum", urban_sum, self.urban, tol)?;
        reconcile(scope, "band rural sum", rural_sum, self.rural, tol)?;
        reconcile(scope, "band population sum", pop_sum, self.urban + self.rural, tol)?;
        reconcile(scope, "class totals", self.urban + self.rural, self.total, tol)?;

        // Partitioned sums equal the ungrouped total by construction from
        // here on: publish the derived totals so the exact equality holds.
        let totals = ScopeTotals {
            population: pop_sum,
            urban: urban_sum,
            rural: rural_sum,
            cells: self.cells,
        };

        if totals.population > 0.0 {
            let share_sum: f64 = bands.iter().map(|b| b.population / totals.population).sum();
            if (share_sum - 1.0).abs() > SHARE_EPS {
                return Err(Error::Reconciliation(format!(
                    "{scope}: band shares sum to {share_sum}, expected 1"
                )));
            }
        }

        let mut cumulative = Vec::with_capacity(self.thresholds.len());
        let (mut cum_urban, mut cum_rural) = (0.0, 0.0);
        for (i, threshold_km) in self.thresholds.iter().copied().enumerate() {
            cum_urban += self.first_urban[i];
            cum_rural += self.first_rural[i];
            let cum_total = cum_urban + cum_rural;

            if let Some(prev) = cumulative.last() {
                let prev: &CumulativeRow = prev;
                if cum_urban < prev.urban - tol || cum_rural < prev.rural - tol {
                    return Err(Error::Reconciliation(format!(
                        "{scope}: cumulative series decreased at {threshold_km} km"
                    )));
                }
            }

            let no_access_total = clamp_residual(scope, totals.population - cum_total, tol)?;
            let no_access = NoAccess {
                total: no_access_total,
                urban: Some(clamp_residual(scope, totals.urban - cum_urban, tol)?),
                rural: Some(clamp_residual(scope, totals.rural - cum_rural, tol)?),
            };

            cumulative.push(CumulativeRow {
                threshold_km,
                urban: cum_urban,
                rural: cum_rural,
                total: cum_total,
                urban_share: share(cum_urban, totals.population),
                rural_share: share(cum_rural, totals.population),
                total_share: share(cum_total, totals.population),
                no_access,
            });
        }

        let gap = (totals.urban > 0.0 && totals.rural > 0.0).then(|| {
            let urban_mean_km = self.urban_wdist / totals.urban;
            let rural_mean_km = self.rural_wdist / totals.rural;
            GapAnalysis {
                urban_mean_km,
                rural_mean_km,
                mean_gap_km: rural_mean_km - urban_mean_km,
                coverage: cumulative.iter()
                    .map(|row| {
                        let urban_pct = 100.0 * share(row.urban, totals.urban);
                        let rural_pct = 100.0 * share(row.rural, totals.rural);
                        CoverageGapRow {
                            threshold_km: row.threshold_km,
                            urban_pct,
                            rural_pct,
                            gap_pct: urban_pct - rural_pct,
                        }
                    })
                    .collect(),
            }
        });

        Ok(ScopeResult {
            scope: scope.to_string(),
            totals,
            bands,
            cumulative,
            gap,
        })
    }
}

#[inline]
fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

fn reconcile(scope: &str, what: &str, got: f64, expected: f64, tol: f64) -> Result<()> {
    if (got - expected).abs() > tol {
        return Err(Error::Reconciliation(format!(
            "{scope}: {what} is {got}, expected {expected}"
        )));
    }
    Ok(())
}

/// Residuals must be non-negative; float noise below tolerance is clamped,
/// anything larger is a defect.
fn clamp_residual(scope: &str, value: f64, tol: f64) -> Result<f64> {
    if value < -tol {
        return Err(Error::Reconciliation(format!(
            "{scope}: negative no-access residual {value}"
        )));
    }
    Ok(value.max(0.0))
}
