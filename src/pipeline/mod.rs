//! The per-scope analysis pipeline and its batch runner.
//!
//! Each scope proceeds strictly Load -> Rasterize -> Distance ->
//! Classify/Bin -> Aggregate; scopes are independent of each other and run
//! in parallel, each worker owning its grids exclusively.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::aggregate::{cell_records, CellRecord, ResultStore, ScopeAccumulator, ScopeResult};
use crate::boundary::Boundaries;
use crate::classify::{ClassPolicy, DistanceBands};
use crate::error::{Error, Result};
use crate::features::{AttrValue, FeatureSet};
use crate::grid::Grid;
use crate::raster::{compute_distances, rasterize};

/// Restrict which features contribute to occupancy, by attribute value
/// (e.g. only road classes 1 and 2).
#[derive(Debug, Clone)]
pub struct ClassFilter {
    pub field: String,
    pub allowed: Vec<AttrValue>,
}

/// Explicit configuration of one analysis run. Scope, classification
/// policy, and threshold lists are parameters here rather than constants
/// baked into each computation.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub policy: ClassPolicy,
    pub bands: DistanceBands,
    pub thresholds: Vec<f64>,
    pub class_filter: Option<ClassFilter>,
}

impl AnalysisConfig {
    /// Standard report configuration: the usual band layout and cumulative
    /// thresholds every kilometer out to 100 km.
    pub fn new(policy: ClassPolicy) -> Self {
        Self {
            policy,
            bands: DistanceBands::standard(),
            thresholds: (1..=100).map(f64::from).collect(),
            class_filter: None,
        }
    }

    pub fn with_class_filter(mut self, field: &str, allowed: Vec<AttrValue>) -> Self {
        self.class_filter = Some(ClassFilter { field: field.to_string(), allowed });
        self
    }

    fn filtered<'a>(&self, features: &'a FeatureSet) -> std::borrow::Cow<'a, FeatureSet> {
        match &self.class_filter {
            Some(filter) => std::borrow::Cow::Owned(features.filter_by(&filter.field, &filter.allowed)),
            None => std::borrow::Cow::Borrowed(features),
        }
    }
}

/// Run the full pipeline for one scope and also return its per-cell
/// records for detail emission.
pub fn run_scope_with_records(
    scope: &str,
    grid: &Grid,
    features: &FeatureSet,
    config: &AnalysisConfig,
) -> Result<(ScopeResult, Vec<CellRecord>)> {
    let features = config.filtered(features);

    let occupancy = rasterize(&features, grid)?;
    let (cell_x_km, cell_y_km) = grid.cell_size_km();
    let distances = compute_distances(&occupancy, cell_x_km, cell_y_km)?;

    let records = cell_records(grid, &distances, config.policy, &config.bands)?;
    let mut acc = ScopeAccumulator::new(config.bands.clone(), config.thresholds.clone())?;
    acc.extend(&records);
    let result = acc.finish(scope)?;

    log::info!(
        "scope {scope}: {} populated cells, population {:.0}",
        result.totals.cells,
        result.totals.population
    );
    Ok((result, records))
}

/// Run the full pipeline for one scope.
pub fn run_scope(
    scope: &str,
    grid: &Grid,
    features: &FeatureSet,
    config: &AnalysisConfig,
) -> Result<ScopeResult> {
    run_scope_with_records(scope, grid, features, config).map(|(result, _)| result)
}

/// The recorded fate of one scope in a batch. Scope-level errors land here
/// instead of aborting sibling scopes.
#[derive(Debug, Clone)]
pub enum ScopeOutcome {
    Complete(ScopeResult),
    /// Boundary and raster did not intersect; recorded as zero coverage.
    ZeroCoverage { scope: String },
    /// No reference features in scope; needs manual review.
    Flagged { scope: String, reason: String },
    /// Unusable input for this scope.
    Failed { scope: String, error: String },
}

impl ScopeOutcome {
    pub fn scope(&self) -> &str {
        match self {
            ScopeOutcome::Complete(result) => &result.scope,
            ScopeOutcome::ZeroCoverage { scope }
            | ScopeOutcome::Flagged { scope, .. }
            | ScopeOutcome::Failed { scope, .. } => scope,
        }
    }

    pub fn result(&self) -> Option<&ScopeResult> {
        match self {
            ScopeOutcome::Complete(result) => Some(result),
            _ => None,
        }
    }
}

/// Outcomes of a batch run, in input order.
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<ScopeOutcome>,
}

impl BatchResult {
    /// Results of the scopes that completed.
    pub fn results(&self) -> Vec<&ScopeResult> {
        self.outcomes.iter().filter_map(|o| o.result()).collect()
    }

    /// Scopes that did not complete, with the reason.
    pub fn skipped(&self) -> Vec<&ScopeOutcome> {
        self.outcomes.iter().filter(|o| o.result().is_none()).collect()
    }

    /// Stash all completed results in a content-addressed store.
    pub fn to_store(&self) -> Result<ResultStore> {
        let mut store = ResultStore::new();
        for result in self.results() {
            store.insert(result.clone())?;
        }
        Ok(store)
    }
}

/// Map a scope run's error onto its recorded outcome; cross-cutting errors
/// propagate and abort the batch.
fn scope_outcome(scope: &str, run: Result<ScopeResult>) -> Result<ScopeOutcome> {
    match run {
        Ok(result) => Ok(ScopeOutcome::Complete(result)),
        Err(Error::NoOverlap) => {
            log::warn!("scope {scope}: boundary does not overlap the raster, recording zero coverage");
            Ok(ScopeOutcome::ZeroCoverage { scope: scope.to_string() })
        }
        Err(err @ Error::NoReferenceFeatures) => {
            log::warn!("scope {scope}: {err}, flagging for review");
            Ok(ScopeOutcome::Flagged { scope: scope.to_string(), reason: err.to_string() })
        }
        Err(err @ (Error::Format(_) | Error::Crs(_) | Error::CrsMismatch { .. })) => {
            log::warn!("scope {scope}: {err}");
            Ok(ScopeOutcome::Failed { scope: scope.to_string(), error: err.to_string() })
        }
        // Reconciliation, configuration, and I/O defects abort the run.
        Err(err) => Err(err),
    }
}

/// Run one grid per scope (e.g. pre-cut country rasters) against a shared
/// feature set. Scope failures are isolated; configuration and
/// reconciliation errors abort.
pub fn run_batch(
    scopes: Vec<(String, Grid)>,
    features: &FeatureSet,
    config: &AnalysisConfig,
) -> Result<BatchResult> {
    let outcomes = scopes.into_par_iter()
        .map(|(scope, grid)| scope_outcome(&scope, run_scope(&scope, &grid, features, config)))
        .collect::<Result<Vec<_>>>()?;
    Ok(BatchResult { outcomes })
}

/// Scope a continental grid by country boundaries and run each country.
pub fn run_countries(
    grid: &Grid,
    boundaries: &Boundaries,
    features: &FeatureSet,
    config: &AnalysisConfig,
) -> Result<BatchResult> {
    if boundaries.epsg() != grid.epsg() {
        return Err(Error::CrsMismatch { features: boundaries.epsg(), grid: grid.epsg() });
    }

    let countries: Vec<&str> = boundaries.names().collect();
    let outcomes = countries.into_par_iter()
        .map(|country| {
            let run = boundaries.scope_grid(grid, country).and_then(|scoped| {
                let clipped = boundaries.clip_features(features, country)?;
                run_scope(country, &scoped, &clipped, config)
            });
            scope_outcome(country, run)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BatchResult { outcomes })
}

/// Find per-scope ASCII rasters under a directory, one scope per file,
/// named by file stem.
pub fn discover_rasters(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut rasters = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::Format(format!("{}: {e}", dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asc")) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            rasters.push((stem.to_string(), path.to_path_buf()));
        }
    }
    rasters.sort();
    Ok(rasters)
}
