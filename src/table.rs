// src/table.rs

use std::collections::HashMap;

/// A single cell. `None` is a null (empty field on disk).
pub type Value = Option<String>;

/// An in-memory record set: ordered column names plus rows of the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; empty strings become nulls.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            );
        }
        table
    }

    /// Append a row, padding with nulls or truncating to the column width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by row number and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Add `name` as an all-null column at the right edge. No-op if present.
    pub fn add_null_column(&mut self, name: &str) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
    }

    /// Project onto `order` exactly: known columns are moved, unknown ones are null.
    pub fn select(&self, order: &[String]) -> Table {
        let indices: Vec<Option<usize>> = order.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i).cloned().flatten()))
                    .collect()
            })
            .collect();
        Table {
            columns: order.to_vec(),
            rows,
        }
    }

    /// Drop every column whose name is in `names`; names not present are ignored.
    /// Returns the names that were actually removed.
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        if keep.len() == self.columns.len() {
            return Vec::new();
        }

        let dropped = self
            .columns
            .iter()
            .filter(|c| names.contains(c))
            .cloned()
            .collect();
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            let old = std::mem::take(row);
            *row = keep.iter().map(|&i| old[i].clone()).collect();
        }
        dropped
    }

    /// Rename every column through `f`, keeping order and data.
    pub fn rename_columns<F: FnMut(&str) -> String>(&mut self, mut f: F) {
        for col in &mut self.columns {
            *col = f(col);
        }
    }

    /// Replace each cell of `column` with `f(cell)`. Returns `false` if the column is absent.
    pub fn map_column<F: FnMut(Option<&str>) -> Value>(&mut self, column: &str, mut f: F) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(row[idx].as_deref());
        }
        true
    }

    /// Collapse columns sharing a name into the first of them, keeping the
    /// first non-null cell of each row. Returns the names that were merged.
    pub fn merge_duplicate_columns(&mut self) -> Vec<String> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut columns: Vec<String> = Vec::new();
        let mut targets = Vec::with_capacity(self.columns.len());
        let mut merged: Vec<String> = Vec::new();
        for c in &self.columns {
            match slots.get(c) {
                Some(&slot) => {
                    targets.push(slot);
                    if !merged.contains(c) {
                        merged.push(c.clone());
                    }
                }
                None => {
                    slots.insert(c.clone(), columns.len());
                    targets.push(columns.len());
                    columns.push(c.clone());
                }
            }
        }
        if merged.is_empty() {
            return merged;
        }

        for row in &mut self.rows {
            let mut out = vec![None; columns.len()];
            for (value, &slot) in std::mem::take(row).into_iter().zip(&targets) {
                if out[slot].is_none() {
                    out[slot] = value;
                }
            }
            *row = out;
        }
        self.columns = columns;
        merged
    }

    /// First `n` rows, same columns.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Row-wise concatenation. Columns are aligned by name in first-seen order;
    /// a table lacking a column contributes nulls for it.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for t in &tables {
            for c in &t.columns {
                if !positions.contains_key(c) {
                    positions.insert(c.clone(), columns.len());
                    columns.push(c.clone());
                }
            }
        }

        let total = tables.iter().map(Table::len).sum();
        let mut out = Table {
            columns,
            rows: Vec::with_capacity(total),
        };
        for t in tables {
            if t.columns == out.columns {
                out.rows.extend(t.rows);
                continue;
            }
            let targets: Vec<usize> = t.columns.iter().map(|c| positions[c]).collect();
            for row in t.rows {
                let mut aligned = vec![None; out.columns.len()];
                for (value, &pos) in row.into_iter().zip(&targets) {
                    if aligned[pos].is_none() {
                        aligned[pos] = value;
                    }
                }
                out.rows.push(aligned);
            }
        }
        out
    }
}
