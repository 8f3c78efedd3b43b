use async_trait::async_trait;
use eyre::{bail, eyre, Result, WrapErr};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use std::time::Duration;
use url::Url;

use super::{fetch_each, send_json, Source};
use crate::release::{Embed, Provider, Release, ReleaseType, Track};
use base::setting::SpotifyConnection;

static PAGE_LIMIT: &str = "50";
static INCLUDE_GROUPS: &str = "album,single";

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Album {
    id: String,
    // a malformed entry must not spoil the whole page
    name: Option<String>,
    album_type: Option<String>,
    images: Option<Vec<Image>>,
    external_urls: Option<ExternalUrls>,
    release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AlbumTrack {
    name: String,
    duration_ms: Option<u64>,
    #[serde(default = "first")]
    disc_number: u32,
    #[serde(default)]
    track_number: u32,
}

fn first() -> u32 {
    1
}

pub struct Spotify {
    conn: SpotifyConnection,
    client: Client,
    concurrency: usize,
}

impl Spotify {
    pub fn new(conn: SpotifyConnection, client: Client, concurrency: usize) -> Self {
        Self {
            conn,
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Client credentials exchange. The token lives for this run only.
    async fn token(&self) -> Result<String> {
        if self.conn.client_id.is_empty() || self.conn.client_secret.is_empty() {
            bail!(
                "Missing Spotify credentials, set {} and {}",
                base::SPOTIFY_CLIENT_ID,
                base::SPOTIFY_CLIENT_SECRET
            );
        }
        let req = self
            .client
            .post(self.conn.token_url.clone())
            .basic_auth(&self.conn.client_id, Some(&self.conn.client_secret))
            .form(&[("grant_type", "client_credentials")]);
        let token: Token = send_json(req)
            .await
            .wrap_err(eyre!("Could not obtain a Spotify access token"))?;
        Ok(token.access_token)
    }

    fn albums_url(&self) -> Result<Url> {
        let mut url = self
            .conn
            .api_url
            .join(format!("artists/{}/albums", self.conn.artist_id).as_str())?;
        url.query_pairs_mut()
            .append_pair("include_groups", INCLUDE_GROUPS)
            .append_pair("limit", PAGE_LIMIT);
        Ok(url)
    }

    fn tracks_url(&self, album_id: &str) -> Result<Url> {
        let mut url = self
            .conn
            .api_url
            .join(format!("albums/{}/tracks", album_id).as_str())?;
        url.query_pairs_mut().append_pair("limit", PAGE_LIMIT);
        Ok(url)
    }

    async fn paged<T: DeserializeOwned>(&self, token: &str, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next {
            let page: Page<T> = send_json(self.client.get(url).bearer_auth(token)).await?;
            items.extend(page.items);
            next = page.next.map(|n| Url::parse(n.as_str())).transpose()?;
        }
        Ok(items)
    }

    async fn release(&self, token: &str, album: Album) -> Result<Release> {
        if title_of(&album).is_empty() {
            bail!("Spotify album {} has no title", album.id);
        }
        let tracks = self
            .paged::<AlbumTrack>(token, self.tracks_url(&album.id)?)
            .await
            .wrap_err(eyre!("Could not fetch the tracks of Spotify album {}", album.id))?;
        Ok(to_release(album, tracks))
    }
}

#[async_trait]
impl Source for Spotify {
    fn provider(&self) -> Provider {
        Provider::Spotify
    }

    async fn releases(&self) -> Result<Vec<Release>> {
        let token = self.token().await?;
        let albums: Vec<Album> = self
            .paged(&token, self.albums_url()?)
            .await
            .wrap_err(eyre!("Could not list the artist's Spotify albums"))?;
        tracing::debug! {count = albums.len(), "Listed Spotify albums"};
        let token = token.as_str();
        Ok(fetch_each(Provider::Spotify, albums, self.concurrency, |album| {
            self.release(token, album)
        })
        .await)
    }
}

fn title_of(album: &Album) -> &str {
    album.name.as_deref().map(str::trim).unwrap_or_default()
}

fn kind_of(album_type: &str) -> ReleaseType {
    match album_type.parse() {
        Ok(ReleaseType::Unknown) | Err(_) => ReleaseType::Unknown,
        Ok(kind) => kind,
    }
}

fn embed_markup(album_id: &str) -> String {
    format!(
        "<iframe style=\"border-radius:12px\" src=\"https://open.spotify.com/embed/album/{}?utm_source=generator\" width=\"100%\" height=\"152\" frameBorder=\"0\" allowfullscreen=\"\" allow=\"autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture\" loading=\"lazy\"></iframe>",
        album_id
    )
}

fn to_release(album: Album, mut tracks: Vec<AlbumTrack>) -> Release {
    tracks.sort_by_key(|t| (t.disc_number, t.track_number));
    Release {
        title: title_of(&album).to_string(),
        kind: kind_of(album.album_type.as_deref().unwrap_or_default()),
        tracks: tracks
            .into_iter()
            .map(|t| Track {
                title: t.name,
                length: t.duration_ms.map(Duration::from_millis),
            })
            .collect(),
        cover_url: album.images.into_iter().flatten().next().map(|i| i.url),
        streaming_url: album.external_urls.and_then(|u| u.spotify),
        store_url: None,
        description: None,
        release_date: album.release_date.filter(|d| !d.is_empty()),
        embed: Some(Embed {
            provider: Provider::Spotify,
            markup: embed_markup(&album.id),
        }),
    }
}
