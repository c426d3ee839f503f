// src/pipeline.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::{fs, path::Path};
use tracing::{info, instrument, warn};

use crate::archive::{self, UnzipReport};
use crate::config::{AcquireConfig, CsvFormat, HarmonizeConfig};
use crate::fetch::{self, DownloadReport};
use crate::process::{clean_combined_file, harmonize_configured, harmonize_union, FilterOutcome};
use crate::save::{save_combined_dataset, SaveOutcome};
use crate::source::CsvDir;
use crate::table::Table;

/// Per-stage results of one acquisition run.
#[derive(Debug)]
pub struct AcquisitionReport {
    pub downloads: DownloadReport,
    pub unzip: UnzipReport,
    pub moved: Vec<std::path::PathBuf>,
}

/// Index page → downloads → unzip → move → cleanup.
/// Only a failed index fetch or a file-system fault aborts the run.
#[instrument(level = "info", skip(client, cfg))]
pub async fn run_acquisition(client: &Client, cfg: &AcquireConfig) -> Result<AcquisitionReport> {
    fs::create_dir_all(&cfg.download_dir)
        .with_context(|| format!("creating {:?}", cfg.download_dir))?;

    let links = fetch::fetch_download_links(client, cfg).await?;
    let downloads = fetch::download_all(client, &links, &cfg.download_dir).await;
    for failed in &downloads.failed {
        warn!(url = %failed.url, error = %failed.error, "not downloaded");
    }
    info!("all downloads attempted");

    let unzip = archive::unzip_all(&cfg.download_dir, &cfg.extract_dir)?;
    let moved = archive::move_extracted(&cfg.extract_dir, &cfg.dest_dir)?;
    archive::cleanup(&cfg.download_dir, &cfg.extract_dir)?;

    Ok(AcquisitionReport {
        downloads,
        unzip,
        moved,
    })
}

fn log_preview(table: &Table) {
    for row in &table.head(5).rows {
        info!(?row, "preview");
    }
}

/// Configured-order harmonization of `raw_dir`, per-file copies into
/// `cleaned_dir`, combined result saved to `combined_path`.
/// `Ok(None)` when `raw_dir` holds no CSV files.
#[instrument(level = "info", skip_all, fields(raw = %raw_dir.display()))]
pub fn prepare_clean_datasets(
    raw_dir: &Path,
    cleaned_dir: &Path,
    combined_path: &Path,
    config: &HarmonizeConfig,
) -> Result<Option<SaveOutcome>> {
    let source = CsvDir::new(raw_dir, CsvFormat::raw());
    let Some(combined) = harmonize_configured(&source, config, Some(cleaned_dir))? else {
        return Ok(None);
    };
    info!(rows = combined.len(), "concatenation done");
    log_preview(&combined);
    Ok(Some(save_combined_dataset(&combined, combined_path)))
}

/// Outcome of the union-mode combine step.
#[derive(Debug)]
pub struct CombineReport {
    pub save: SaveOutcome,
    /// Present only when the combined file was saved.
    pub filter: Option<FilterOutcome>,
}

/// Union-mode harmonization of `cleaned_dir` (read as `format`), saved to
/// `combined_path`, then filtered into `filtered_path`.
/// `Ok(None)` when there is nothing to combine.
#[instrument(level = "info", skip_all, fields(dir = %cleaned_dir.display()))]
pub fn combine_datasets(
    cleaned_dir: &Path,
    format: CsvFormat,
    combined_path: &Path,
    filtered_path: &Path,
    config: &HarmonizeConfig,
) -> Result<Option<CombineReport>> {
    let source = CsvDir::new(cleaned_dir, format);
    let Some(combined) = harmonize_union(&source)? else {
        return Ok(None);
    };
    info!(rows = combined.len(), "concatenation done");
    log_preview(&combined);

    let save = save_combined_dataset(&combined, combined_path);
    let filter = if save.is_saved() {
        Some(clean_combined_file(combined_path, filtered_path, config)?)
    } else {
        warn!("combined dataset not saved, column filter skipped");
        None
    };
    Ok(Some(CombineReport { save, filter }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::csv_io::read_table;
    use crate::fetch::test_server::{serve, Routes};
    use crate::logging::init_test_logging;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn preview_is_visible_at_info() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut table = Table::new(vec!["n1".into()]);
        for i in 0..8 {
            table.push_row(vec![Some(format!("row{i}"))]);
        }
        tracing::subscriber::with_default(subscriber, || log_preview(&table));

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out.matches("preview").count(), 5);
        assert!(out.contains("row4"));
        assert!(!out.contains("row5"));
    }

    #[test]
    fn prepare_then_combine() -> Result<()> {
        init_test_logging();
        let root = TempDir::new()?;
        let raw = root.path().join("raw_datasets");
        let cleaned = root.path().join("cleaned_datasets");
        fs::create_dir_all(&raw)?;
        fs::write(
            raw.join("euromillions_2004.csv"),
            b"annee_numero_de_tirage;jour_de_tirage;date_de_tirage;boule_1;devise;\n\
              2004007;VE;20040319;12;eur;\n",
        )?;
        fs::write(
            raw.join("euromillions_2020.csv"),
            b"annee_numero_de_tirage;date_de_tirage;jour_de_tirage;boule_1;etoile_1;\n\
              2020015;21/02/2020;VENDREDI;3;9;\n",
        )?;

        let config = HarmonizeConfig::new(
            &["annee_numero_de_tirage", "date_de_tirage", "boule_1", "etoile_1"],
            &["jour_de_tirage"],
        );
        let combined_cleaned = root.path().join("combined_cleaned_dataset.csv");
        let saved = prepare_clean_datasets(&raw, &cleaned, &combined_cleaned, &config)?;
        assert_eq!(saved, Some(SaveOutcome::Saved { rows: 2 }));

        let t = read_table(&combined_cleaned, &CsvFormat::utf8())?;
        assert_eq!(t.columns, config.target_columns);
        assert_eq!(t.get(0, "date_de_tirage"), Some("19/03/2004"));
        assert_eq!(t.get(0, "etoile_1"), None);
        assert_eq!(t.get(1, "date_de_tirage"), Some("21/02/2020"));

        let combined = root.path().join("combined_dataset.csv");
        let filtered = root.path().join("cleaned_combined_dataset.csv");
        let report =
            combine_datasets(&cleaned, CsvFormat::utf8(), &combined, &filtered, &config)?
                .expect("cleaned copies exist");
        assert!(report.save.is_saved());
        let filter = report.filter.expect("filter ran");
        assert!(filter.missing.is_empty());
        assert_eq!(read_table(&filtered, &CsvFormat::utf8())?, t);
        Ok(())
    }

    #[test]
    fn empty_directories_yield_none() -> Result<()> {
        let root = TempDir::new()?;
        let p = root.path();
        let cfg = HarmonizeConfig::default();
        assert!(prepare_clean_datasets(p, &p.join("c"), &p.join("x.csv"), &cfg)?.is_none());
        let (y, z) = (p.join("y.csv"), p.join("z.csv"));
        assert!(combine_datasets(p, CsvFormat::utf8(), &y, &z, &cfg)?.is_none());
        Ok(())
    }

    #[test]
    fn filter_skipped_when_save_fails() -> Result<()> {
        let root = TempDir::new()?;
        fs::write(root.path().join("a.csv"), "n1\n1\n")?;
        let bad = root.path().join("missing_dir").join("combined.csv");
        let filtered = root.path().join("filtered.csv");

        let cfg = HarmonizeConfig::default();
        let report = combine_datasets(root.path(), CsvFormat::raw(), &bad, &filtered, &cfg)?
            .expect("one file");
        assert!(matches!(report.save, SaveOutcome::Failed(_)));
        assert!(report.filter.is_none());
        assert!(!filtered.exists());
        Ok(())
    }

    #[tokio::test]
    async fn acquisition_end_to_end() -> Result<()> {
        let mut routes = Routes::new();
        let page = r#"<a class="block" href="/f/euromillions_2004">2004</a>
            <a class="block" href="/f/euromillions_2019.zip">2019</a>
            <a class="block" href="/f/broken.zip">broken</a>
            <a class="block" href="/f/notice.pdf">notice</a>"#;
        routes.insert("/historique".into(), (200, page.as_bytes().to_vec()));
        let first = zip_bytes(&[("euromillions_2004.csv", "n1\n1\n")])?;
        let second = zip_bytes(&[("euromillions_2019.csv", "n1\n2\n")])?;
        routes.insert("/f/euromillions_2004".into(), (200, first));
        routes.insert("/f/euromillions_2019.zip".into(), (200, second));
        routes.insert("/f/notice.pdf".into(), (200, b"%PDF-1.4".to_vec()));
        let addr = serve(routes).await;

        let root = TempDir::new()?;
        let cfg = AcquireConfig {
            index_url: format!("http://{}/historique", addr),
            download_dir: root.path().join("datasets_euromillions"),
            extract_dir: root.path().join("temp_extract"),
            dest_dir: root.path().join("raw_datasets"),
            max_retries: 0,
            initial_backoff: Duration::from_millis(1),
            ..AcquireConfig::default()
        };

        let report = run_acquisition(&Client::new(), &cfg).await?;
        assert_eq!(report.downloads.succeeded.len(), 3);
        assert_eq!(report.downloads.failed.len(), 1);
        assert_eq!(report.unzip.extracted.len(), 2);
        assert_eq!(report.unzip.skipped.len(), 1);
        assert_eq!(report.moved.len(), 2);
        assert!(cfg.dest_dir.join("euromillions_2004.csv").exists());
        assert!(!cfg.download_dir.exists());
        assert!(!cfg.extract_dir.exists());
        Ok(())
    }
}
