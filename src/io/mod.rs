//! Format-specific writing of aggregate outputs.
//!
//! - `csv` - band / cumulative / per-cell detail tables
//! - `json` - per-scope, batch, and region documents

mod csv;
mod json;

pub use csv::{write_band_table, write_cell_detail, write_cumulative_table};
pub use json::{read_scope_json, write_batch_json, write_region_json, write_scope_json};
