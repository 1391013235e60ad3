use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use reachgrid::{
    io, read_asc, read_asc_with_epsg, run_scope_with_records, AnalysisConfig, AttrValue,
    CellRecord, ClassPolicy, DistanceBands, Error, FeatureSet, ScopeResult,
    DEFAULT_URBAN_DENSITY,
};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::AnalyzeArgs) -> Result<()> {
    let config = build_config(args)?;
    let out_dir = args.output.clone().unwrap_or(".".into());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let rasters = reachgrid::discover_rasters(&args.rasters)?;
    if rasters.is_empty() {
        bail!("no .asc rasters under {}", args.rasters.display());
    }
    let features = reachgrid::read_shapefile(&args.features)?;
    println!(
        "[analyze] {} raster(s), {} feature(s), {} band(s)",
        rasters.len(),
        features.len(),
        config.bands.len()
    );

    let mut results: Vec<ScopeResult> = Vec::new();
    let mut skipped: Vec<(String, String)> = Vec::new();
    for (scope, path) in &rasters {
        match analyze_scope(scope, path, &features, &config, args) {
            Ok((result, records)) => {
                emit_scope(&result, &records, &out_dir, args)?;
                results.push(result);
            }
            // Logic and configuration defects abort; bad per-scope input
            // is recorded and the batch continues.
            Err(err @ (Error::Reconciliation(_) | Error::Config(_) | Error::Io(_))) => {
                return Err(err.into());
            }
            Err(err) => {
                log::warn!("scope {scope}: {err}");
                skipped.push((scope.clone(), err.to_string()));
            }
        }
    }

    let refs: Vec<&ScopeResult> = results.iter().collect();
    io::write_batch_json(&refs, &out_dir.join("summary.json"))?;

    println!("[analyze] {} scope(s) completed, {} skipped", results.len(), skipped.len());
    for (scope, reason) in &skipped {
        println!("[analyze]   skipped {scope}: {reason}");
    }
    Ok(())
}

fn analyze_scope(
    scope: &str,
    raster: &Path,
    features: &FeatureSet,
    config: &AnalysisConfig,
    args: &crate::cli::AnalyzeArgs,
) -> reachgrid::Result<(ScopeResult, Vec<CellRecord>)> {
    let grid = match args.epsg {
        Some(code) => read_asc_with_epsg(raster, code)?,
        None => read_asc(raster)?,
    };
    let features = features.reproject_to(grid.epsg())?;
    run_scope_with_records(scope, &grid, &features, config)
}

fn emit_scope(
    result: &ScopeResult,
    records: &[CellRecord],
    out_dir: &Path,
    args: &crate::cli::AnalyzeArgs,
) -> Result<()> {
    let scope = &result.scope;
    io::write_scope_json(result, &out_dir.join(format!("{scope}.json")))?;
    io::write_band_table(result, &out_dir.join(format!("{scope}_bands.csv")))?;
    io::write_cumulative_table(result, &out_dir.join(format!("{scope}_cumulative.csv")))?;
    if args.detail {
        io::write_cell_detail(scope, records, &out_dir.join(format!("result_{scope}_detailed.csv")))?;
    }
    Ok(())
}

fn build_config(args: &crate::cli::AnalyzeArgs) -> Result<AnalysisConfig> {
    let policy = match args.policy.as_str() {
        "sign" => {
            if args.urban_density.is_some() {
                bail!("--urban-density only applies to the threshold policy");
            }
            ClassPolicy::Sign
        }
        "threshold" => ClassPolicy::Threshold {
            min_urban_density: args.urban_density.unwrap_or(DEFAULT_URBAN_DENSITY),
        },
        other => bail!("unknown classification policy {other:?} (expected sign or threshold)"),
    };

    let mut config = AnalysisConfig::new(policy);
    if let Some(bands) = &args.bands {
        config.bands = DistanceBands::new(parse_km_list(bands)?)?;
    }
    if let Some(thresholds) = &args.thresholds {
        config.thresholds = parse_km_list(thresholds)?;
    }
    match (&args.filter_field, &args.filter_values) {
        (Some(field), Some(values)) => {
            config = config.with_class_filter(field, parse_attr_list(values));
        }
        (None, None) => {}
        _ => bail!("--filter-field and --filter-values must be given together"),
    }
    Ok(config)
}

fn parse_km_list(list: &str) -> Result<Vec<f64>> {
    list.split(',')
        .map(|token| {
            token.trim().parse::<f64>()
                .with_context(|| format!("invalid distance {token:?}"))
        })
        .collect()
}

/// Numeric tokens filter numeric attributes, anything else matches as text.
fn parse_attr_list(list: &str) -> Vec<AttrValue> {
    list.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>()
                .map(AttrValue::from)
                .unwrap_or_else(|_| AttrValue::from(token))
        })
        .collect()
}
