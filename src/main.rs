use anyhow::Result;
use clap::Parser;
use euroscraper::{config, fetch, logging, pipeline, AcquireConfig};
use std::path::PathBuf;
use tracing::{error, info};

/// Download the draw-history archives and unpack them into the raw directory.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = config::INDEX_URL)]
    index_url: String,
    #[arg(long, default_value = config::DOWNLOAD_DIR)]
    download_dir: PathBuf,
    #[arg(long, default_value = config::EXTRACT_DIR)]
    extract_dir: PathBuf,
    #[arg(long, default_value = config::RAW_DIR)]
    dest_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init("info");
    let args = Args::parse();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let cfg = AcquireConfig {
        index_url: args.index_url,
        download_dir: args.download_dir,
        extract_dir: args.extract_dir,
        dest_dir: args.dest_dir,
        ..AcquireConfig::default()
    };
    let client = fetch::build_client()?;

    // ─── 3) fetch, unzip, relocate, clean up ─────────────────────────
    let report = pipeline::run_acquisition(&client, &cfg).await?;
    for failed in &report.downloads.failed {
        error!(url = %failed.url, error = %failed.error, "failed download");
    }
    info!(
        downloaded = report.downloads.succeeded.len(),
        failed = report.downloads.failed.len(),
        extracted = report.unzip.extracted.len(),
        skipped = report.unzip.skipped.len(),
        moved = report.moved.len(),
        "all done"
    );
    Ok(())
}
