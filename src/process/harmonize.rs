use anyhow::{Context, Result};
use std::{collections::HashSet, fs, path::Path};
use tracing::{debug, info, instrument, warn};

use crate::config::HarmonizeConfig;
use crate::process::date_parser::normalize_date_column;
use crate::process::utils::prefixed_file_name;
use crate::save::save_combined_dataset;
use crate::source::TableSource;
use crate::table::Table;

/// First-seen union of the headers of `names`.
fn collect_columns<S: TableSource + ?Sized>(source: &S, names: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for name in names {
        info!(file = %name, "collecting columns");
        let headers = source
            .headers(name)
            .with_context(|| format!("reading headers of {}", name))?;
        for h in headers {
            if seen.insert(h.clone()) {
                columns.push(h);
            }
        }
    }
    Ok(columns)
}

/// Every column name seen across the source, each once, in first-seen order.
pub fn union_columns<S: TableSource + ?Sized>(source: &S) -> Result<Vec<String>> {
    let names = source.names()?;
    collect_columns(source, &names)
}

/// Union mode: pad every table to the union of all headers and stack them
/// in encounter order. `None` when the source holds no tables.
#[instrument(level = "info", skip(source))]
pub fn harmonize_union<S: TableSource + ?Sized>(source: &S) -> Result<Option<Table>> {
    let names = source.names()?;
    if names.is_empty() {
        info!("no CSV files found");
        return Ok(None);
    }

    let columns = collect_columns(source, &names)?;
    debug!(?columns, "column universe");

    let mut tables = Vec::with_capacity(names.len());
    for name in &names {
        info!(file = %name, "harmonizing");
        let mut table = source
            .load(name)
            .with_context(|| format!("loading {}", name))?;
        for col in &columns {
            table.add_null_column(col);
        }
        tables.push(table.select(&columns));
    }

    let combined = Table::concat(tables);
    info!(
        files = names.len(),
        rows = combined.len(),
        cols = combined.columns.len(),
        "union harmonization done"
    );
    Ok(Some(combined))
}

/// Configured-order mode. Each table is projected onto the configured target
/// columns that appear in at least one source (null where this file lacks
/// one), its date column is normalized, and, with a `sink`, a per-file copy
/// named `<cleaned_prefix><file>` is written there. `None` on an empty source.
#[instrument(level = "info", skip(source, config, sink))]
pub fn harmonize_configured<S: TableSource + ?Sized>(
    source: &S,
    config: &HarmonizeConfig,
    sink: Option<&Path>,
) -> Result<Option<Table>> {
    let names = source.names()?;
    if names.is_empty() {
        info!("no CSV files found");
        return Ok(None);
    }

    let observed: HashSet<String> = collect_columns(source, &names)?.into_iter().collect();
    let (columns, absent): (Vec<String>, Vec<String>) = config
        .target_columns
        .iter()
        .cloned()
        .partition(|c| observed.contains(c));
    if !absent.is_empty() {
        warn!(?absent, "configured columns missing from every file");
    }
    let normalize = columns.contains(&config.date_column);
    if !normalize {
        warn!(column = %config.date_column, "date column not selected, dates left untouched");
    }

    if let Some(dir) = sink {
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }

    let mut tables = Vec::with_capacity(names.len());
    for name in &names {
        info!(file = %name, "selecting configured columns");
        let raw = source
            .load(name)
            .with_context(|| format!("loading {}", name))?;
        let mut table = raw.select(&columns);
        if normalize {
            normalize_date_column(&mut table, &config.date_column);
        }

        if let Some(dir) = sink {
            let out = dir.join(prefixed_file_name(&config.cleaned_prefix, name));
            save_combined_dataset(&table, &out);
        }
        tables.push(table);
    }

    let combined = Table::concat(tables);
    info!(
        files = names.len(),
        rows = combined.len(),
        cols = combined.columns.len(),
        "configured harmonization done"
    );
    Ok(Some(combined))
}
