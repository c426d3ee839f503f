// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;

pub mod urls;
pub mod zips;

pub use urls::{extract_links, fetch_download_links};
pub use zips::{download_all, download_file, DownloadReport, FailedDownload};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the acquisition steps.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .build()
        .context("building HTTP client")
}
