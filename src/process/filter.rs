use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::config::{CsvFormat, HarmonizeConfig};
use crate::csv_io::{read_table, write_table};
use crate::process::utils::sanitize_column_name;
use crate::table::Table;

/// Filtered table plus the configured columns it could not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub table: Table,
    pub missing: Vec<String>,
}

/// Second-pass cleanup of a combined table:
/// sanitize names, merge columns that now share a name, drop
/// `columns_to_delete`, keep the target columns in order.
/// Missing target columns are reported and skipped.
pub fn filter_columns(mut table: Table, config: &HarmonizeConfig) -> FilterOutcome {
    table.rename_columns(sanitize_column_name);
    let merged = table.merge_duplicate_columns();
    if !merged.is_empty() {
        warn!(?merged, "columns with the same cleaned name merged");
    }

    let dropped = table.drop_columns(&config.columns_to_delete);
    if !dropped.is_empty() {
        info!(?dropped, "dropped unwanted columns");
    }

    let missing: Vec<String> = config
        .target_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "configured columns not present in the dataset");
    }

    let keep: Vec<String> = config
        .target_columns
        .iter()
        .filter(|c| table.has_column(c))
        .cloned()
        .collect();

    FilterOutcome {
        table: table.select(&keep),
        missing,
    }
}

/// Read the combined file at `input`, filter it and write the result to `output`.
#[instrument(
    level = "info",
    skip(input, output, config),
    fields(input = %input.as_ref().display())
)]
pub fn clean_combined_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &HarmonizeConfig,
) -> Result<FilterOutcome> {
    let input = input.as_ref();
    let output = output.as_ref();

    let table = read_table(input, &CsvFormat::utf8())
        .with_context(|| format!("loading combined dataset {:?}", input))?;
    info!(columns = ?table.columns, "available columns");

    let outcome = filter_columns(table, config);
    write_table(&outcome.table, output)
        .with_context(|| format!("writing cleaned dataset {:?}", output))?;
    info!(path = %output.display(), cols = outcome.table.columns.len(), "cleaned and reordered");
    Ok(outcome)
}
