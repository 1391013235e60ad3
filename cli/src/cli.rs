use std::path::PathBuf;

/// Accessibility CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "reachgrid", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the accessibility analysis over per-country rasters
    Analyze(AnalyzeArgs),

    /// Roll per-country results up into region tables
    Rollup(RollupArgs),
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory of per-country population rasters (.asc, named by country)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub rasters: PathBuf,

    /// Road or facility shapefile measured against
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub features: PathBuf,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// EPSG code of the rasters when no .prj sidecar is present
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Classification policy: "sign" or "threshold"
    #[arg(long, default_value = "threshold")]
    pub policy: String,

    /// Urban density cutoff (threshold policy only)
    #[arg(long)]
    pub urban_density: Option<f64>,

    /// Distance band breakpoints in km, comma-separated (e.g. 1,2,5,10)
    #[arg(long)]
    pub bands: Option<String>,

    /// Cumulative thresholds in km, comma-separated
    #[arg(long)]
    pub thresholds: Option<String>,

    /// Attribute field restricting which features count (e.g. GP_RTP)
    #[arg(long)]
    pub filter_field: Option<String>,

    /// Allowed values of the filter field, comma-separated (e.g. 1,2)
    #[arg(long)]
    pub filter_values: Option<String>,

    /// Also emit per-cell detail CSVs for auditing
    #[arg(long)]
    pub detail: bool,
}

#[derive(clap::Args, Debug)]
pub struct RollupArgs {
    /// Directory of per-country result JSON files
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub results: PathBuf,

    /// Region map JSON: [{"region": ..., "members": [...]}, ...]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Output file, defaults to "./regions.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
