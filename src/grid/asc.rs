//! ESRI ASCII grid reading.

use std::{fs::File, io::{BufRead, BufReader, Read}, path::Path};

use ndarray::Array2;

use crate::error::{Error, Result};
use super::{Grid, GridTransform};

/// Load a single-band ESRI ASCII grid. The coordinate reference is taken
/// from a sidecar `.prj` file next to the source; a source without one
/// fails with a CRS error (use [`read_asc_with_epsg`] to declare it).
pub fn read_asc(path: &Path) -> Result<Grid> {
    let epsg = sidecar_epsg(path)?;
    read_asc_with_epsg(path, epsg)
}

/// Load a single-band ESRI ASCII grid with an explicitly declared EPSG code.
pub fn read_asc_with_epsg(path: &Path, epsg: u32) -> Result<Grid> {
    let file = File::open(path)?;
    parse_asc(BufReader::new(file), epsg)
        .map_err(|e| match e {
            Error::Format(msg) => Error::Format(format!("{}: {msg}", path.display())),
            other => other,
        })
}

/// Parse the ASCII grid format from any reader.
pub(crate) fn parse_asc<R: BufRead>(reader: R, epsg: u32) -> Result<Grid> {
    let mut ncols = None;
    let mut nrows = None;
    let mut xll = None;
    let mut yll = None;
    let mut x_is_center = false;
    let mut cellsize = None;
    let mut nodata = -9999.0;

    let mut lines = reader.lines();
    let mut values: Vec<f64> = Vec::new();

    for line in &mut lines {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else { continue };

        // Header keys are alphabetic; the first numeric token starts the body.
        if key.as_bytes()[0].is_ascii_alphabetic() {
            let value: f64 = parts.next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| Error::Format(format!("header line {key:?} has no numeric value")))?;
            match key.to_ascii_lowercase().as_str() {
                "ncols" => ncols = Some(value as usize),
                "nrows" => nrows = Some(value as usize),
                "xllcorner" => xll = Some(value),
                "xllcenter" => { xll = Some(value); x_is_center = true; }
                "yllcorner" => yll = Some(value),
                "yllcenter" => { yll = Some(value); x_is_center = true; }
                "cellsize" => cellsize = Some(value),
                "nodata_value" => nodata = value,
                other => return Err(Error::Format(format!("unrecognized header key {other:?}"))),
            }
        } else {
            push_row(&line, nodata, &mut values)?;
            break;
        }
    }

    let ncols = ncols.ok_or_else(|| Error::Format("missing ncols header".into()))?;
    let nrows = nrows.ok_or_else(|| Error::Format("missing nrows header".into()))?;
    let cellsize = cellsize.ok_or_else(|| Error::Format("missing cellsize header".into()))?;
    let mut xll = xll.ok_or_else(|| Error::Format("missing xllcorner header".into()))?;
    let mut yll = yll.ok_or_else(|| Error::Format("missing yllcorner header".into()))?;
    if x_is_center {
        xll -= cellsize / 2.0;
        yll -= cellsize / 2.0;
    }

    for line in lines {
        let line = line?;
        push_row(&line, nodata, &mut values)?;
    }

    if values.len() != nrows * ncols {
        return Err(Error::Format(format!(
            "expected {} values ({nrows}x{ncols}), found {}",
            nrows * ncols,
            values.len()
        )));
    }

    // Rows are stored top-down; yll is the bottom edge.
    let transform = GridTransform::north_up(xll, yll + nrows as f64 * cellsize, cellsize, cellsize)?;
    let data = Array2::from_shape_vec((nrows, ncols), values)
        .map_err(|e| Error::Format(e.to_string()))?;
    Grid::from_array(data, transform, epsg, nodata)
}

fn push_row(line: &str, nodata: f64, out: &mut Vec<f64>) -> Result<()> {
    for token in line.split_whitespace() {
        let value: f64 = token.parse()
            .map_err(|_| Error::Format(format!("invalid cell value {token:?}")))?;
        out.push(if value.is_nan() { nodata } else { value });
    }
    Ok(())
}

/// Resolve the EPSG code from the sidecar `.prj` next to a raster.
fn sidecar_epsg(path: &Path) -> Result<u32> {
    let prj = path.with_extension("prj");
    if !prj.exists() {
        return Err(Error::Crs(format!("no .prj sidecar next to {}", path.display())));
    }
    let mut text = String::new();
    File::open(&prj)?.read_to_string(&mut text)?;
    parse_prj(&text)
        .ok_or_else(|| Error::Crs(format!("unrecognized coordinate reference in {}", prj.display())))
}

/// Recognize the EPSG code inside a `.prj` body: an explicit
/// `AUTHORITY["EPSG","nnnn"]`, a bare `EPSG:nnnn`, or a well-known
/// geographic datum name.
pub(crate) fn parse_prj(text: &str) -> Option<u32> {
    // Last AUTHORITY entry names the whole CRS.
    if let Some(pos) = text.rfind("AUTHORITY[\"EPSG\",\"") {
        let rest = &text[pos + "AUTHORITY[\"EPSG\",\"".len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }
    if let Some(pos) = text.find("EPSG:") {
        let digits: String = text[pos + 5..].chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }
    if text.starts_with("GEOGCS") {
        if text.contains("WGS_1984") || text.contains("WGS 84") {
            return Some(4326);
        }
        if text.contains("North_American_1983") || text.contains("NAD83") {
            return Some(4269);
        }
    }
    None
}
