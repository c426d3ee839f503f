// src/fetch/urls.rs
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::{collections::HashSet, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::AcquireConfig;

/// Anchors matching `selector`, `href` resolved against `base`, first occurrence kept.
pub fn extract_links(html: &str, base: &Url, selector: &str) -> Result<Vec<Url>> {
    let sel = Selector::parse(selector)
        .map_err(|e| anyhow!("invalid CSS selector {:?}: {:?}", selector, e))?;
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let links = doc
        .select(&sel)
        .filter_map(|e| e.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|u| seen.insert(u.clone()))
        .collect();
    Ok(links)
}

/// Delay before retry number `attempt` (1-based): doubles each time, saturating.
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// GET the index page. Transport errors are retried with exponential backoff;
/// a non-success status fails straight away.
async fn get_index_html(
    client: &Client,
    url: &Url,
    max_retries: u32,
    initial_backoff: Duration,
) -> Result<String> {
    let mut attempts = 0;
    loop {
        match client.get(url.clone()).send().await {
            Ok(resp) => {
                let status = resp.status();
                if !status.is_success() {
                    bail!("HTTP error {} fetching {}", status, url);
                }
                return resp
                    .text()
                    .await
                    .with_context(|| format!("reading body from {}", url));
            }
            Err(e) if attempts < max_retries => {
                attempts += 1;
                let backoff = backoff_delay(initial_backoff, attempts);
                warn!(
                    %url,
                    attempt = attempts,
                    delay_ms = backoff.as_millis() as u64,
                    error = %e,
                    "retrying"
                );
                sleep(backoff).await;
            }
            Err(e) => {
                error!(%url, error = %e, "exhausted retries");
                return Err(e).with_context(|| format!("GET {}", url));
            }
        }
    }
}

/// Download links listed on the configured index page.
#[instrument(level = "info", skip(client, cfg), fields(index = %cfg.index_url))]
pub async fn fetch_download_links(client: &Client, cfg: &AcquireConfig) -> Result<Vec<Url>> {
    let base = Url::parse(&cfg.index_url)
        .with_context(|| format!("parsing index URL {}", cfg.index_url))?;
    let html = get_index_html(client, &base, cfg.max_retries, cfg.initial_backoff).await?;
    let links = extract_links(&html, &base, &cfg.link_selector)?;
    for link in &links {
        debug!(%link, "found download link");
    }
    info!(count = links.len(), "download links found");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_server::{serve, Routes};

    const PAGE: &str = r#"<html><body>
        <a class="block" href="https://media.example.com/euromillions_202002.zip">2020</a>
        <a class="block" href="/files/euromillions_201902.zip">2019</a>
        <a class="block" href="/files/euromillions_201902.zip">2019 again</a>
        <a class="nav" href="/ignored.zip">nav</a>
        <a class="block">no href</a>
    </body></html>"#;

    #[test]
    fn extracts_block_links_only() -> Result<()> {
        let base = Url::parse("https://www.fdj.fr/jeux-de-tirage/euromillions/historique")?;
        let links = extract_links(PAGE, &base, "a.block")?;
        let links: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            links,
            vec![
                "https://media.example.com/euromillions_202002.zip",
                "https://www.fdj.fr/files/euromillions_201902.zip",
            ]
        );
        Ok(())
    }

    #[test]
    fn bad_selector_is_an_error() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(extract_links(PAGE, &base, "a[").is_err());
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
    }

    #[tokio::test]
    async fn unreachable_index_is_retried_then_fails() {
        // bind then drop so nothing is listening on the port
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .unwrap();
        let cfg = AcquireConfig {
            index_url: format!("http://{}/historique", addr),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            ..AcquireConfig::default()
        };

        let err = fetch_download_links(&Client::new(), &cfg)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains(&format!("GET http://{}", addr)));
    }

    #[tokio::test]
    async fn index_fetch_and_status_failure() -> Result<()> {
        let mut routes = Routes::new();
        routes.insert("/historique".into(), (200, PAGE.as_bytes().to_vec()));
        routes.insert("/gone".into(), (503, Vec::new()));
        let addr = serve(routes).await;
        let client = Client::new();

        let cfg = AcquireConfig {
            index_url: format!("http://{}/historique", addr),
            ..AcquireConfig::default()
        };
        let links = fetch_download_links(&client, &cfg).await?;
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].path(), "/files/euromillions_201902.zip");

        let cfg = AcquireConfig {
            index_url: format!("http://{}/gone", addr),
            ..AcquireConfig::default()
        };
        let err = fetch_download_links(&client, &cfg).await.unwrap_err();
        assert!(format!("{:#}", err).contains("503"));
        Ok(())
    }
}
