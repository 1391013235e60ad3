//! JSON emission of aggregate results.

use std::{collections::BTreeMap, fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};

use crate::aggregate::{RegionResult, RollupAudit, ScopeResult};

/// Write one scope's aggregate record.
pub fn write_scope_json(result: &ScopeResult, path: &Path) -> Result<()> {
    write_pretty(path, result)
}

/// Write all completed scopes as one map keyed by scope name.
pub fn write_batch_json(results: &[&ScopeResult], path: &Path) -> Result<()> {
    let by_scope: BTreeMap<&str, &ScopeResult> =
        results.iter().map(|r| (r.scope.as_str(), *r)).collect();
    write_pretty(path, &by_scope)
}

/// Write region rollups together with the audit of unmapped countries and
/// missing members.
pub fn write_region_json(regions: &[RegionResult], audit: &RollupAudit, path: &Path) -> Result<()> {
    #[derive(serde::Serialize)]
    struct RegionDocument<'a> {
        regions: &'a [RegionResult],
        audit: &'a RollupAudit,
    }
    write_pretty(path, &RegionDocument { regions, audit })
}

/// Read back a scope result (e.g. a per-country file produced by an
/// earlier run) for merging.
pub fn read_scope_json(path: &Path) -> Result<ScopeResult> {
    let file = File::open(path)
        .with_context(|| format!("[io::json] Failed to read {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("[io::json] Failed to parse {}", path.display()))
}

fn write_pretty<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("[io::json] Failed to write {}", path.display()))?;
    Ok(())
}
