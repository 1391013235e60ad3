use std::{fs, fs::File, io::BufReader};

use anyhow::{bail, Context, Result};
use reachgrid::{io, RegionMap, ScopeResult};

#[derive(serde::Deserialize)]
struct RegionEntry {
    region: String,
    members: Vec<String>,
}

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RollupArgs) -> Result<()> {
    let file = File::open(&args.regions)
        .with_context(|| format!("Failed to open region map {}", args.regions.display()))?;
    let entries: Vec<RegionEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse region map {}", args.regions.display()))?;
    let map = RegionMap::from_pairs(entries.into_iter().map(|e| (e.region, e.members)));

    let mut results: Vec<ScopeResult> = Vec::new();
    for entry in fs::read_dir(&args.results)
        .with_context(|| format!("Failed to read {}", args.results.display()))?
    {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            continue;
        }
        // Non-scope files (e.g. a batch summary) are skipped, not fatal.
        match io::read_scope_json(&path) {
            Ok(result) => results.push(result),
            Err(err) => log::warn!("skipping {}: {err:#}", path.display()),
        }
    }
    if results.is_empty() {
        bail!("no scope results under {}", args.results.display());
    }
    results.sort_by(|a, b| a.scope.cmp(&b.scope));
    println!(
        "[rollup] merging {} scope result(s) into {} region(s)",
        results.len(),
        map.len()
    );

    let rollup = map.rollup(&results)?;
    for (region, result) in rollup.regions.iter().map(|r| (&r.region, r)) {
        println!(
            "[rollup]   {region}: {} member(s), population {:.0}",
            result.members.len(),
            result.totals.population
        );
    }
    for scope in &rollup.audit.unmapped {
        println!("[rollup]   unmapped country: {scope}");
    }
    for (region, member) in &rollup.audit.missing {
        println!("[rollup]   {region} member absent from data: {member}");
    }

    let out = args.output.clone().unwrap_or("./regions.json".into());
    io::write_region_json(&rollup.regions, &rollup.audit, &out)?;
    println!("[rollup] wrote {}", out.display());
    Ok(())
}
