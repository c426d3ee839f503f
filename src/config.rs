// src/config.rs

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

/// FDJ history page listing the yearly result archives.
pub const INDEX_URL: &str = "https://www.fdj.fr/jeux-de-tirage/euromillions-my-million/historique";
/// Anchors carrying the download links.
pub const LINK_SELECTOR: &str = "a.block";

pub const DOWNLOAD_DIR: &str = "datasets_euromillions";
pub const EXTRACT_DIR: &str = "temp_extract";
pub const RAW_DIR: &str = "raw_datasets";
pub const CLEANED_DIR: &str = "cleaned_datasets";

pub const COMBINED_FILE: &str = "combined_dataset.csv";
pub const CLEANED_COMBINED_FILE: &str = "cleaned_combined_dataset.csv";
pub const COMBINED_CLEANED_FILE: &str = "combined_cleaned_dataset.csv";

const DEFAULT_TARGET_COLUMNS: &[&str] = &[
    "annee_numero_de_tirage",
    "jour_de_tirage",
    "date_de_tirage",
    "boule_1",
    "boule_2",
    "boule_3",
    "boule_4",
    "boule_5",
    "etoile_1",
    "etoile_2",
    "boules_gagnantes_en_ordre_croissant",
    "etoiles_gagnantes_en_ordre_croissant",
];

const DEFAULT_COLUMNS_TO_DELETE: &[&str] = &[
    "date_de_forclusion",
    "numero_jokerplus",
    "devise",
    "numero_my_million",
];

/// Column configuration handed to every harmonization call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarmonizeConfig {
    /// Columns that survive, in output order.
    pub target_columns: Vec<String>,
    /// Columns removed by the post-save filter whether or not they are targets.
    pub columns_to_delete: Vec<String>,
    /// Column run through the date normalizer in configured-order mode.
    pub date_column: String,
    /// Prefix for per-file cleaned copies.
    pub cleaned_prefix: String,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        Self {
            target_columns: DEFAULT_TARGET_COLUMNS.iter().map(|s| s.to_string()).collect(),
            columns_to_delete: DEFAULT_COLUMNS_TO_DELETE
                .iter()
                .map(|s| s.to_string())
                .collect(),
            date_column: "date_de_tirage".into(),
            cleaned_prefix: "cleaned_".into(),
        }
    }
}

impl HarmonizeConfig {
    pub fn new(target_columns: &[&str], columns_to_delete: &[&str]) -> Self {
        Self {
            target_columns: target_columns.iter().map(|s| s.to_string()).collect(),
            columns_to_delete: columns_to_delete.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Load from YAML; omitted keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    /// Defaults unless a config path was given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_yaml_file(p),
            None => Ok(Self::default()),
        }
    }
}

/// Delimiter and text encoding of a CSV file.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl CsvFormat {
    /// Source files as published: `;` and Latin-1 (decoded as its Windows-1252 superset).
    pub fn raw() -> Self {
        Self {
            delimiter: b';',
            encoding: WINDOWS_1252,
        }
    }

    /// Files written by this crate.
    pub fn utf8() -> Self {
        Self {
            delimiter: b';',
            encoding: UTF_8,
        }
    }
}

/// Everything the acquisition pipeline needs.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    pub index_url: String,
    pub link_selector: String,
    pub download_dir: std::path::PathBuf,
    pub extract_dir: std::path::PathBuf,
    pub dest_dir: std::path::PathBuf,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            index_url: INDEX_URL.into(),
            link_selector: LINK_SELECTOR.into(),
            download_dir: DOWNLOAD_DIR.into(),
            extract_dir: EXTRACT_DIR.into(),
            dest_dir: RAW_DIR.into(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}
