use async_trait::async_trait;
use eyre::{bail, eyre, Result, WrapErr};
use itertools::Itertools;
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_derive::Deserialize;
use std::time::Duration;
use url::Url;

use super::{decode, fetch_each, send_text, Source};
use crate::release::{Embed, Provider, Release, Track};
use crate::render::escape;
use base::setting::BandcampConnection;

lazy_static! {
    static ref GRID_LINK_SELECTOR: Selector = Selector::parse("#music-grid li a").unwrap();
    static ref GRID_ITEMS_SELECTOR: Selector =
        Selector::parse("#music-grid[data-client-items]").unwrap();
    static ref TRALBUM_SELECTOR: Selector = Selector::parse("[data-tralbum]").unwrap();
    static ref COVER_SELECTOR: Selector = Selector::parse("meta[property='og:image']").unwrap();
}

static EMBED_OPTIONS: &str = "size=large/bgcol=ffffff/linkcol=0687f5/tracklist=false/artwork=small";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Album,
    Track,
}

/// One entry of the discography listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub kind: ItemKind,
    pub url: Url,
}

#[derive(Debug, Deserialize)]
struct ClientItem {
    page_url: String,
}

#[derive(Debug, Deserialize)]
struct TrAlbum {
    #[serde(default)]
    current: Current,
    #[serde(default)]
    trackinfo: Vec<TrackInfo>,
    url: Option<String>,
    artist: Option<String>,
    album_release_date: Option<String>,
}

#[derive(Default, Debug, Deserialize)]
struct Current {
    title: Option<String>,
    release_date: Option<String>,
    about: Option<String>,
    id: Option<u64>,
    featured_track_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    title: Option<String>,
    duration: Option<f64>,
    id: Option<u64>,
    track_num: Option<u32>,
}

pub struct Bandcamp {
    conn: BandcampConnection,
    client: Client,
    concurrency: usize,
}

impl Bandcamp {
    pub fn new(conn: BandcampConnection, client: Client, concurrency: usize) -> Self {
        Self {
            conn,
            client,
            concurrency: concurrency.max(1),
        }
    }

    async fn release(&self, item: Item) -> Result<Release> {
        send_text(self.client.get(item.url.clone()))
            .await
            .and_then(|html| parse_item(&item, html.as_str()))
            .wrap_err(eyre!("Could not read Bandcamp item {}", item.url))
    }
}

#[async_trait]
impl Source for Bandcamp {
    fn provider(&self) -> Provider {
        Provider::Bandcamp
    }

    async fn releases(&self) -> Result<Vec<Release>> {
        let music = self.conn.url.join("music")?;
        let html = send_text(self.client.get(music))
            .await
            .wrap_err(eyre!("Could not load the Bandcamp discography"))?;
        let items = parse_discography(&self.conn.url, html.as_str());
        if items.is_empty() {
            tracing::warn! {url = %self.conn.url, "No releases listed on the Bandcamp discography"};
        }
        tracing::debug! {count = items.len(), "Listed Bandcamp items"};
        Ok(fetch_each(Provider::Bandcamp, items, self.concurrency, |item| {
            self.release(item)
        })
        .await)
    }
}

fn item_at(base: &Url, href: &str) -> Option<Item> {
    let url = base.join(href).ok()?;
    let kind = match url.path_segments()?.next()? {
        "album" => ItemKind::Album,
        "track" => ItemKind::Track,
        _ => return None,
    };
    Some(Item { kind, url })
}

/// Collects the grid links plus the overflow items Bandcamp only ships as
/// JSON, in page order and without duplicates.
pub fn parse_discography(base: &Url, html: &str) -> Vec<Item> {
    let document = Html::parse_document(html);
    let linked = document
        .select(&GRID_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect::<Vec<_>>();
    let overflow = document
        .select(&GRID_ITEMS_SELECTOR)
        .filter_map(|grid| grid.value().attr("data-client-items"))
        .flat_map(|json| match decode::<Vec<ClientItem>>(json) {
            Ok(items) => items.into_iter().map(|i| i.page_url).collect::<Vec<_>>(),
            Err(error) => {
                tracing::debug! {?error, "Ignoring unreadable Bandcamp client items"};
                Vec::new()
            }
        })
        .collect::<Vec<_>>();
    linked
        .iter()
        .chain(overflow.iter())
        .filter_map(|href| item_at(base, href))
        .unique()
        .collect()
}

fn player(src: &str, url: &str, title: &str, artist: Option<&str>) -> String {
    let caption = match artist {
        Some(a) => format!("{} by {}", title, a),
        None => title.to_string(),
    };
    format!(
        "<iframe style=\"border: 0; width: 100%; height: 120px;\" src=\"https://bandcamp.com/EmbeddedPlayer/{}/transparent=true/\" seamless><a href=\"{}\">{}</a></iframe>",
        src,
        escape(url),
        escape(&caption)
    )
}

/// Player for a single track release, or for the album (opened on its
/// featured track when there is one).
fn embed_markup(
    kind: ItemKind,
    tralbum: &TrAlbum,
    track_count: usize,
    url: &str,
    title: &str,
) -> Option<String> {
    let track_id = tralbum
        .current
        .featured_track_id
        .or_else(|| tralbum.trackinfo.first().and_then(|t| t.id));
    // on track pages the current id is the track itself
    let album_id = match kind {
        ItemKind::Album => tralbum.current.id,
        ItemKind::Track => None,
    };
    let artist = tralbum.artist.as_deref();
    let src = match (track_count, album_id, track_id) {
        (1, _, Some(track)) => format!("track={}/{}", track, EMBED_OPTIONS),
        (n, Some(album), Some(track)) if n > 1 => {
            format!("album={}/{}/track={}", album, EMBED_OPTIONS, track)
        }
        (n, Some(album), None) if n > 1 => format!("album={}/{}", album, EMBED_OPTIONS),
        _ => return None,
    };
    Some(player(src.as_str(), url, title, artist))
}

fn parse_item(item: &Item, html: &str) -> Result<Release> {
    let document = Html::parse_document(html);
    let raw = document
        .select(&TRALBUM_SELECTOR)
        .find_map(|e| e.value().attr("data-tralbum"))
        .ok_or(eyre!("Page has no release data"))?;
    let tralbum: TrAlbum = decode(raw)?;
    let cover_url = document
        .select(&COVER_SELECTOR)
        .find_map(|e| e.value().attr("content"))
        .map(str::to_string);

    let title = tralbum
        .current
        .title
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if title.is_empty() {
        bail!("Release has no title");
    }

    let mut infos = tralbum.trackinfo.iter().collect::<Vec<_>>();
    infos.sort_by_key(|t| t.track_num.unwrap_or(u32::MAX));
    let tracks = infos
        .into_iter()
        .map(|t| Track {
            title: t.title.clone().unwrap_or_default(),
            length: t
                .duration
                .filter(|d| *d > 0.0)
                .and_then(|d| Duration::try_from_secs_f64(d).ok()),
        })
        .collect::<Vec<_>>();

    let store_url = tralbum
        .url
        .clone()
        .unwrap_or_else(|| item.url.to_string());
    let embed = embed_markup(item.kind, &tralbum, tracks.len(), &store_url, &title);
    if embed.is_none() {
        tracing::debug! {%title, tracks = tracks.len(), "No Bandcamp player available"};
    }

    Ok(Release {
        kind: Default::default(),
        tracks,
        cover_url,
        description: tralbum.current.about.clone().filter(|a| !a.trim().is_empty()),
        release_date: tralbum
            .current
            .release_date
            .clone()
            .or_else(|| tralbum.album_release_date.clone()),
        embed: embed.map(|markup| Embed {
            provider: Provider::Bandcamp,
            markup,
        }),
        store_url: Some(store_url),
        streaming_url: None,
        title,
    })
}
