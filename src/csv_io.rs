// src/csv_io.rs

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::{borrow::Cow, fs, path::Path};
use tracing::{trace, warn};

use crate::config::CsvFormat;
use crate::table::{Table, Value};

/// Read and decode a whole file. A BOM, if any, overrides `format.encoding`.
fn decode_file<'a>(bytes: &'a [u8], path: &Path, format: &CsvFormat) -> Cow<'a, str> {
    let (text, used, had_errors) = format.encoding.decode(bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = used.name(),
            "malformed bytes replaced while decoding"
        );
    }
    text
}

/// Header names, dropping the phantom column a trailing delimiter produces.
fn header_names(record: &StringRecord) -> Vec<String> {
    let mut names: Vec<String> = record.iter().map(str::to_string).collect();
    if names.len() > 1 && names.last().is_some_and(|n| n.trim().is_empty()) {
        names.pop();
    }
    names
}

fn to_value(field: &str) -> Value {
    (!field.is_empty()).then(|| field.to_string())
}

/// Parse a delimited file with a header row into a [`Table`].
/// Short records are null-padded, long ones truncated to the header width.
/// Repeated header names collapse into one column.
pub fn read_table<P: AsRef<Path>>(path: P, format: &CsvFormat) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let text = decode_file(&bytes, path, format);

    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {:?}", path))?;
    let mut table = Table::new(header_names(headers));
    let width = table.columns.len();

    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        table.push_row(record.iter().take(width).map(to_value).collect());
    }

    let merged = table.merge_duplicate_columns();
    if !merged.is_empty() {
        warn!(path = %path.display(), ?merged, "duplicate header names merged");
    }

    trace!(path = %path.display(), rows = table.len(), cols = table.columns.len(), "read table");
    Ok(table)
}

/// Header row only.
pub fn read_headers<P: AsRef<Path>>(path: P, format: &CsvFormat) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let text = decode_file(&bytes, path, format);

    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {:?}", path))?;
    Ok(header_names(headers))
}

/// Write `table` as UTF-8, `;`-delimited, header row first, no index column.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating {:?}", path))?;

    wtr.write_record(&table.columns)
        .with_context(|| format!("writing header to {:?}", path))?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))
            .with_context(|| format!("writing row to {:?}", path))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}
