//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};

use crate::aggregate::{CellRecord, ScopeResult};

/// Write a DataFrame to a CSV file.
fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {:?}", path))
}

/// Write a scope's band table (one row per discrete distance band).
pub fn write_band_table(result: &ScopeResult, path: &Path) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Series::new("band".into(), result.bands.iter().map(|b| b.label.clone()).collect::<Vec<_>>()).into(),
        Series::new("low_km".into(), result.bands.iter().map(|b| b.low_km).collect::<Vec<_>>()).into(),
        Series::new("high_km".into(), result.bands.iter().map(|b| b.high_km).collect::<Vec<_>>()).into(),
        Series::new("population".into(), result.bands.iter().map(|b| b.population).collect::<Vec<_>>()).into(),
        Series::new("urban".into(), result.bands.iter().map(|b| b.urban).collect::<Vec<_>>()).into(),
        Series::new("rural".into(), result.bands.iter().map(|b| b.rural).collect::<Vec<_>>()).into(),
        Series::new("cells".into(), result.bands.iter().map(|b| b.cells).collect::<Vec<_>>()).into(),
    ])?;
    write_csv(&mut df, path)
}

/// Write a scope's cumulative-threshold table.
pub fn write_cumulative_table(result: &ScopeResult, path: &Path) -> Result<()> {
    let rows = &result.cumulative;
    let mut df = DataFrame::new(vec![
        Series::new("threshold_km".into(), rows.iter().map(|r| r.threshold_km).collect::<Vec<_>>()).into(),
        Series::new("urban".into(), rows.iter().map(|r| r.urban).collect::<Vec<_>>()).into(),
        Series::new("rural".into(), rows.iter().map(|r| r.rural).collect::<Vec<_>>()).into(),
        Series::new("total".into(), rows.iter().map(|r| r.total).collect::<Vec<_>>()).into(),
        Series::new("urban_share".into(), rows.iter().map(|r| r.urban_share).collect::<Vec<_>>()).into(),
        Series::new("rural_share".into(), rows.iter().map(|r| r.rural_share).collect::<Vec<_>>()).into(),
        Series::new("total_share".into(), rows.iter().map(|r| r.total_share).collect::<Vec<_>>()).into(),
        Series::new("no_access_total".into(), rows.iter().map(|r| r.no_access.total).collect::<Vec<_>>()).into(),
        Series::new("no_access_urban".into(), rows.iter().map(|r| r.no_access.urban).collect::<Vec<_>>()).into(),
        Series::new("no_access_rural".into(), rows.iter().map(|r| r.no_access.rural).collect::<Vec<_>>()).into(),
    ])?;
    write_csv(&mut df, path)
}

/// Write per-cell detail rows for auditing, in the layout the aggregation
/// scripts downstream expect: country, pop_density, distance.
pub fn write_cell_detail(scope: &str, records: &[CellRecord], path: &Path) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Series::new("country".into(), vec![scope.to_string(); records.len()]).into(),
        Series::new("pop_density".into(), records.iter().map(|r| r.population).collect::<Vec<_>>()).into(),
        Series::new("distance".into(), records.iter().map(|r| r.distance_km).collect::<Vec<_>>()).into(),
        Series::new("class".into(), records.iter().map(|r| r.class.as_str().to_string()).collect::<Vec<_>>()).into(),
    ])?;
    write_csv(&mut df, path)
}

#[cfg(test)]
mod tests {
    use crate::classify::{Class, DistanceBands};
    use crate::aggregate::ScopeAccumulator;
    use super::*;

    fn sample_result() -> ScopeResult {
        let bands = DistanceBands::standard();
        let mut acc = ScopeAccumulator::new(bands.clone(), vec![1.0, 5.0]).unwrap();
        for (class, pop, dist) in [
            (Class::Urban, 100.0, 0.5),
            (Class::Rural, 40.0, 3.0),
        ] {
            acc.push(&CellRecord {
                row: 0, col: 0, population: pop, class,
                distance_km: dist, band: bands.band_of(dist),
            });
        }
        acc.finish("Alandia").unwrap()
    }

    #[test]
    fn band_table_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bands.csv");
        write_band_table(&sample_result(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "band,low_km,high_km,population,urban,rural,cells"
        );
        assert!(text.contains("0-1km"));
        assert!(text.contains(">100km"));
    }

    #[test]
    fn cumulative_table_includes_no_access_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cumulative.csv");
        write_cumulative_table(&sample_result(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("threshold_km,"));
        assert!(text.contains("no_access_total"));
        assert_eq!(text.lines().count(), 3); // header + two thresholds
    }

    #[test]
    fn cell_detail_uses_the_downstream_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detail.csv");
        let records = vec![CellRecord {
            row: 0, col: 0, population: 12.0, class: Class::Urban,
            distance_km: 0.4, band: 0,
        }];
        write_cell_detail("Alandia", &records, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), "country,pop_density,distance,class");
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("Alandia,"));
        assert!(row.ends_with(",urban"));
    }
}
