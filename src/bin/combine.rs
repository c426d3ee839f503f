use anyhow::Result;
use clap::Parser;
use euroscraper::{config, logging, pipeline, CsvFormat, HarmonizeConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Union-harmonize the cleaned files, save them combined, then filter the columns.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = config::CLEANED_DIR)]
    input_dir: PathBuf,
    #[arg(long, default_value = config::COMBINED_FILE)]
    combined: PathBuf,
    #[arg(long, default_value = config::CLEANED_COMBINED_FILE)]
    output: PathBuf,
    /// Read the inputs as Latin-1 instead of UTF-8 (e.g. straight from the raw directory).
    #[arg(long)]
    latin1: bool,
    /// YAML file overriding the column lists.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();
    let cfg = HarmonizeConfig::load_or_default(args.config.as_deref())?;
    let format = if args.latin1 {
        CsvFormat::raw()
    } else {
        CsvFormat::utf8()
    };

    let Some(report) =
        pipeline::combine_datasets(&args.input_dir, format, &args.combined, &args.output, &cfg)?
    else {
        warn!(dir = %args.input_dir.display(), "nothing to combine");
        return Ok(());
    };

    match report.filter {
        Some(f) if f.missing.is_empty() => info!(path = %args.output.display(), "done"),
        Some(f) => warn!(
            missing = ?f.missing,
            path = %args.output.display(),
            "done with missing columns"
        ),
        None => warn!(outcome = ?report.save, "combined file not written"),
    }
    Ok(())
}
