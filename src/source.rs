// src/source.rs

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::config::CsvFormat;
use crate::csv_io;
use crate::table::Table;

/// An ordered collection of named tables the harmonizers can read.
pub trait TableSource {
    /// Source names in encounter order.
    fn names(&self) -> Result<Vec<String>>;

    /// Column names of one source; defaults to a full load.
    fn headers(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.load(name)?.columns)
    }

    fn load(&self, name: &str) -> Result<Table>;
}

/// `*.csv` files sitting directly in one directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct CsvDir {
    dir: PathBuf,
    format: CsvFormat,
}

impl CsvDir {
    pub fn new(dir: impl Into<PathBuf>, format: CsvFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl TableSource for CsvDir {
    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).with_context(|| format!("listing {:?}", self.dir))? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 file name");
                continue;
            };
            if name.to_lowercase().ends_with(".csv") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn headers(&self, name: &str) -> Result<Vec<String>> {
        csv_io::read_headers(self.path(name), &self.format)
    }

    fn load(&self, name: &str) -> Result<Table> {
        csv_io::read_table(self.path(name), &self.format)
    }
}

/// Tables already in memory, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Vec<(String, Table)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, table: Table) -> Self {
        self.tables.push((name.to_string(), table));
        self
    }
}

impl TableSource for MemorySource {
    fn names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|(n, _)| n.clone()).collect())
    }

    fn load(&self, name: &str) -> Result<Table> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
            .ok_or_else(|| anyhow!("no table named {}", name))
    }
}
