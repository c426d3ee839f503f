use anyhow::Result;
use clap::Parser;
use euroscraper::{config, logging, pipeline, HarmonizeConfig, SaveOutcome};
use std::path::PathBuf;
use tracing::{info, warn};

/// Select, reorder and date-normalize the raw files; write per-file copies and one combined file.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = config::RAW_DIR)]
    raw_dir: PathBuf,
    #[arg(long, default_value = config::CLEANED_DIR)]
    cleaned_dir: PathBuf,
    #[arg(long, default_value = config::COMBINED_CLEANED_FILE)]
    output: PathBuf,
    /// YAML file overriding the column lists.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();
    let cfg = HarmonizeConfig::load_or_default(args.config.as_deref())?;

    match pipeline::prepare_clean_datasets(&args.raw_dir, &args.cleaned_dir, &args.output, &cfg)? {
        Some(SaveOutcome::Saved { rows }) => info!(rows, path = %args.output.display(), "done"),
        Some(other) => warn!(outcome = ?other, "combined file not written"),
        None => warn!(dir = %args.raw_dir.display(), "nothing to prepare"),
    }
    Ok(())
}
