mod bandcamp;
mod spotify;

pub use bandcamp::Bandcamp;
pub use spotify::Spotify;

use async_trait::async_trait;
use const_format::formatcp;
use eyre::{bail, eyre, Result, WrapErr};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Instant;

use crate::release::{Provider, Release};
use base::setting::{Http, Settings};

static DISCOG_USER_AGENT: &str =
    formatcp!("{}/{} ({})", base::CLI_NAME, base::VERSION, base::GITHUB);

/// A provider of releases. Failing items are skipped inside the
/// implementation; an `Err` means the whole provider is unavailable.
#[async_trait]
pub trait Source: Send + Sync {
    fn provider(&self) -> Provider;
    async fn releases(&self) -> Result<Vec<Release>>;
}

pub fn client(http: &Http) -> Result<Client> {
    Client::builder()
        .user_agent(DISCOG_USER_AGENT)
        .timeout(http.timeout())
        .gzip(true)
        .build()
        .wrap_err(eyre!("Could not build the HTTP client"))
}

pub fn sources(settings: &Settings, client: Client) -> Vec<Box<dyn Source>> {
    let mut sources: Vec<Box<dyn Source>> = Vec::new();
    if settings.spotify.enabled {
        sources.push(Box::new(Spotify::new(
            settings.spotify.clone(),
            client.clone(),
            settings.http.concurrency,
        )));
    }
    if settings.bandcamp.enabled {
        sources.push(Box::new(Bandcamp::new(
            settings.bandcamp.clone(),
            client,
            settings.http.concurrency,
        )));
    }
    sources
}

/// Runs every source concurrently. Results keep the order of `sources`,
/// and an unavailable provider contributes an empty list.
pub async fn fetch_all(sources: &[Box<dyn Source>]) -> Vec<(Provider, Vec<Release>)> {
    join_all(sources.iter().map(|source| async move {
        let provider = source.provider();
        let start = Instant::now();
        match source.releases().await {
            Ok(releases) => {
                let elapsed = start.elapsed();
                tracing::info! {%provider, count = releases.len(), ?elapsed, "Fetched releases"};
                (provider, releases)
            }
            Err(error) => {
                tracing::warn! {%provider, ?error, "Provider unavailable, continuing without it"};
                (provider, Vec::new())
            }
        }
    }))
    .await
}

/// Looks up every listed item with at most `concurrency` lookups in flight.
/// Results keep the listing order; a failed item is logged and dropped.
pub(crate) async fn fetch_each<T, F, Fut>(
    provider: Provider,
    items: Vec<T>,
    concurrency: usize,
    fetch: F,
) -> Vec<Release>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<Release>>,
{
    stream::iter(items)
        .map(fetch)
        .buffered(concurrency.max(1))
        .filter_map(move |res| async move {
            match res {
                Ok(release) => Some(release),
                Err(error) => {
                    tracing::warn! {%provider, ?error, "Skipping item"};
                    None
                }
            }
        })
        .collect()
        .await
}

pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(text)).map_err(|e| {
        eyre!(
            "Error while decoding JSON at path {}: {}",
            e.path().to_string(),
            e
        )
    })
}

pub(crate) async fn send_text(req: RequestBuilder) -> Result<String> {
    let start = Instant::now();
    let res = req.send().await?;
    let url = res.url().clone();
    tracing::trace! {%url, req_time = ?start.elapsed(), "HTTP request done"};
    if !res.status().is_success() {
        bail!(
            "Request to {} returned non-success error code: {} {}",
            url,
            res.status(),
            res.text().await.unwrap_or_default()
        );
    }
    res.text()
        .await
        .wrap_err(eyre!("Could not read response as text"))
}

pub(crate) async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let text = send_text(req).await?;
    decode(text.as_str())
}
