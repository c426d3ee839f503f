use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{error, info};
use url::Url;

/// One link that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDownload {
    pub url: String,
    pub error: String,
}

/// What a batch of downloads produced. One bad link never stops the batch.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<FailedDownload>,
}

impl DownloadReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Local file name for `url`: its last non-empty path segment.
pub fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("download.zip")
        .to_string()
}

/// Stream `url` to `dest_dir/<last path segment>` chunk by chunk.
/// Returns the full path of the saved file.
pub async fn download_file(
    client: &Client,
    url: &Url,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {:?}", dest_dir))?;
    let dest_path = dest_dir.join(file_name_for(url));

    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?;

    let mut file = fs::File::create(&dest_path)
        .await
        .with_context(|| format!("creating {:?}", dest_path))?;
    let mut body = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("reading body from {}", url))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    info!(path = %dest_path.display(), bytes = written, "downloaded");
    Ok(dest_path)
}

/// Download every link in order, folding each outcome into a [`DownloadReport`].
pub async fn download_all(client: &Client, urls: &[Url], dest_dir: &Path) -> DownloadReport {
    let report = stream::iter(urls)
        .fold(DownloadReport::default(), |mut report, url| async move {
            match download_file(client, url, dest_dir).await {
                Ok(path) => report.succeeded.push(path),
                Err(e) => {
                    error!(%url, error = %format!("{:#}", e), "download failed");
                    report.failed.push(FailedDownload {
                        url: url.to_string(),
                        error: format!("{:#}", e),
                    });
                }
            }
            report
        })
        .await;

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "downloads finished"
    );
    report
}
