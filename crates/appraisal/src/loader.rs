//! Delimited-file loader.

use crate::error::Result;
use appraisal_protocol::{RecordSet, Value};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load a CSV file into a record set with lower-cased column names.
pub fn load_csv(path: &Path) -> Result<RecordSet> {
    info!(path = %path.display(), "Loading data");
    let file = File::open(path)?;
    let records = load_csv_reader(file)?;
    info!(rows = records.len(), "Loaded records");
    Ok(records)
}

/// Load CSV text from any reader. The first line is the header.
///
/// Empty cells and the usual NA tokens become nulls, `true`/`false` become
/// booleans and numeric text becomes integers or floats. The literal `Null`
/// stays text.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Value::parse_cell).collect::<Vec<_>>());
    }
    debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV");

    let mut records = RecordSet::from_rows(headers, rows)?;
    records.lowercase_columns()?;
    Ok(records)
}
