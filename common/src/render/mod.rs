mod gallery;
mod template;

pub use gallery::{rewrite_gallery, update_catalogue, Card, DISC_END, DISC_START};
pub use template::{fill, Templates};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::release::{Release, ReleaseClass};
use base::setting::Site;
use base::util::{date_only, format_length, mkdirp};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No {0} template available")]
    MissingTemplate(ReleaseClass),

    #[error("Title {0:?} does not produce a usable file name")]
    EmptySlug(String),

    #[error("Could not read {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Could not write {0:?}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Another release already published {0:?}")]
    DuplicatePage(PathBuf),

    #[error("Gallery markers not found in {0:?}")]
    MissingMarkers(PathBuf),
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn tracks_html(release: &Release) -> String {
    release
        .tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "\n      <li class=\"tracklist-item\">\n        <span class=\"track-number\">{}.</span>\n        <span class=\"track-title\">{}</span>\n        <span class=\"track-length\">{}</span>\n      </li>",
                i + 1,
                escape(&t.title),
                format_length(t.length)
            )
        })
        .collect()
}

/// Artwork replacing the plain text title, looked up as `<dir>/<slug>.png`.
#[derive(Debug, Clone)]
pub struct TitleImages {
    dir: PathBuf,
    link: String,
}

impl TitleImages {
    pub fn new(dir: PathBuf, link: &str) -> Self {
        TitleImages {
            dir,
            link: link.trim_end_matches('/').to_string(),
        }
    }

    fn src(&self, slug: &str) -> Option<String> {
        let name = format!("{}.png", slug);
        if self.dir.join(&name).is_file() {
            Some(format!("{}/{}", self.link, name))
        } else {
            None
        }
    }

    pub fn page_title(&self, title: &str, slug: &str) -> String {
        match self.src(slug) {
            Some(src) => format!(
                "<img src=\"{}\" alt=\"{}\" style=\"max-width:90%;height:auto;filter:invert(1);display:inline-block;\">",
                escape(&src),
                escape(title)
            ),
            None => format!("<span style=\"color:#fff;\">{}</span>", escape(title)),
        }
    }

    pub fn card_title(&self, title: &str, slug: &str) -> String {
        match self.src(slug) {
            Some(src) => format!(
                "<img src=\"{}\" alt=\"{} Title\" style=\"max-width:100%;height:auto;\">",
                escape(&src),
                escape(title)
            ),
            None => escape(title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PathBuf,
    pub html: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub pages: usize,
    pub skipped: usize,
    pub failures: usize,
    pub catalogue_updated: bool,
}

pub struct Renderer {
    templates: Templates,
    releases_dir: PathBuf,
    releases_link: String,
    catalogue: PathBuf,
    titles: TitleImages,
}

fn link_or_empty(value: &Option<String>) -> String {
    value.as_deref().map(escape).unwrap_or_default()
}

impl Renderer {
    pub fn new(site: &Site) -> Self {
        Renderer {
            templates: Templates::load(&site.templates_dir()),
            releases_dir: site.releases_dir(),
            releases_link: site.releases_link.trim_end_matches('/').to_string(),
            catalogue: site.catalogue_path(),
            titles: TitleImages::new(site.titles_dir(), &site.titles_link),
        }
    }

    fn slug(release: &Release) -> Result<String, RenderError> {
        let slug = release.slug();
        if slug.is_empty() {
            return Err(RenderError::EmptySlug(release.title.clone()));
        }
        Ok(slug)
    }

    pub fn page(&self, release: &Release) -> Result<Page, RenderError> {
        let class = release.class();
        let template = self
            .templates
            .get(class)
            .ok_or(RenderError::MissingTemplate(class))?;
        let slug = Self::slug(release)?;

        let streaming = link_or_empty(&release.streaming_url);
        let store = link_or_empty(&release.store_url);
        let values = HashMap::from([
            ("title", escape(&release.title)),
            ("title_html", self.titles.page_title(&release.title, &slug)),
            ("type", release.kind.to_string()),
            ("cover_url", link_or_empty(&release.cover_url)),
            ("spotify_url", streaming.clone()),
            ("streaming_url", streaming),
            ("bandcamp_url", store.clone()),
            ("store_url", store),
            ("tracks", tracks_html(release)),
            (
                "description",
                release.description.as_deref().map(escape).unwrap_or_default(),
            ),
            (
                "embed",
                release
                    .embed
                    .as_ref()
                    .map(|e| e.markup.clone())
                    .unwrap_or_default(),
            ),
            (
                "release_date",
                release.release_date.as_deref().map(date_only).unwrap_or_default(),
            ),
            ("slug", slug.clone()),
        ]);

        Ok(Page {
            path: self
                .releases_dir
                .join(class.directory())
                .join(format!("{}.html", slug)),
            html: fill(template, &values),
        })
    }

    pub fn write(&self, page: &Page) -> Result<(), RenderError> {
        if let Some(parent) = page.path.parent() {
            mkdirp(parent).map_err(|e| RenderError::Write(parent.to_path_buf(), e))?;
        }
        fs::write(&page.path, page.html.as_bytes())
            .map_err(|e| RenderError::Write(page.path.clone(), e))
    }

    pub fn card(&self, release: &Release) -> Result<Card, RenderError> {
        let slug = Self::slug(release)?;
        Ok(Card {
            link: format!(
                "{}/{}/{}.html",
                self.releases_link,
                release.class().directory(),
                slug
            ),
            cover: release.cover_url.clone().unwrap_or_default(),
            title_html: self.titles.card_title(&release.title, &slug),
            title: release.title.clone(),
            date: release.date(),
        })
    }

    /// Writes every release page, then refreshes the catalogue gallery with
    /// the releases whose page was written. Failures are counted and
    /// logged, never fatal to the rest.
    pub fn publish(&self, releases: &[Release]) -> Published {
        let mut res = Published::default();
        let mut written = HashSet::new();
        let mut cards = Vec::new();
        for release in releases {
            let page = self.page(release).and_then(|page| {
                // the first release claiming a file keeps it
                if written.contains(&page.path) {
                    return Err(RenderError::DuplicatePage(page.path));
                }
                self.write(&page)?;
                Ok(page)
            });
            match page.and_then(|page| Ok((self.card(release)?, page))) {
                Ok((card, page)) => {
                    tracing::debug! {title = %release.title, path = ?page.path, "Wrote release page"};
                    written.insert(page.path);
                    cards.push(card);
                    res.pages += 1;
                }
                Err(error @ (RenderError::EmptySlug(_) | RenderError::DuplicatePage(_))) => {
                    tracing::warn! {title = %release.title, %error, "Skipping release page"};
                    res.skipped += 1;
                }
                Err(error) => {
                    tracing::warn! {title = %release.title, %error, "Release not published"};
                    res.failures += 1;
                }
            }
        }

        match update_catalogue(&self.catalogue, cards) {
            Ok(changed) => res.catalogue_updated = changed,
            Err(error @ RenderError::Write(..)) => {
                tracing::error! {%error, "Could not update the catalogue"};
                res.failures += 1;
            }
            Err(error) => tracing::warn! {%error, "Catalogue gallery left untouched"},
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{Embed, Provider, ReleaseType, Track};
    use std::time::Duration;
    use tempfile::TempDir;

    fn site(dir: &TempDir) -> Site {
        Site {
            root: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn setup(dir: &TempDir) -> Renderer {
        let site = site(dir);
        let templates = site.templates_dir();
        fs::create_dir_all(&templates).unwrap();
        fs::write(
            templates.join("single_template.html"),
            "<h1>{{ title_html }}</h1><ol>{{tracks}}</ol>{{embed}}<p>{{release_date}}</p><a href=\"{{streaming_url}}\">{{type}}</a>{{unknown}}",
        )
        .unwrap();
        fs::write(
            templates.join("album_template.html"),
            "<h1>{{title}}</h1>{{description}}",
        )
        .unwrap();
        Renderer::new(&site)
    }

    fn single() -> Release {
        Release {
            title: "Glow & Fade".to_string(),
            kind: ReleaseType::Single,
            tracks: vec![Track {
                title: "Glow".to_string(),
                length: Some(Duration::from_secs(185)),
            }],
            streaming_url: Some("https://open.spotify.com/album/x".to_string()),
            release_date: Some("24 Jul 2025 18:00:30 GMT".to_string()),
            embed: Some(Embed {
                provider: Provider::Bandcamp,
                markup: "<iframe></iframe>".to_string(),
            }),
            ..Default::default()
        }
    }

    fn album() -> Release {
        Release {
            title: "Blue Hour".to_string(),
            kind: ReleaseType::Ep,
            tracks: (1..=4)
                .map(|i| Track {
                    title: format!("Part {}", i),
                    length: None,
                })
                .collect(),
            description: Some("Live <at> home".to_string()),
            release_date: Some("2024-07-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a & <b> \"c\" 'd'"), "a &amp; &lt;b&gt; &quot;c&quot; &#39;d&#39;");
    }

    #[test]
    fn renders_single_page() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let page = renderer.page(&single()).unwrap();
        assert_eq!(
            page.path,
            dir.path().join("releases").join("singles").join("glow-fade.html")
        );
        assert!(page
            .html
            .starts_with("<h1><span style=\"color:#fff;\">Glow &amp; Fade</span></h1>"));
        assert!(page.html.contains("<span class=\"track-number\">1.</span>"));
        assert!(page.html.contains("<span class=\"track-length\">3:05</span>"));
        assert!(page.html.contains("<iframe></iframe>"));
        assert!(page.html.contains("<p>24 Jul 2025</p>"));
        assert!(page
            .html
            .ends_with("<a href=\"https://open.spotify.com/album/x\">single</a>"));
    }

    #[test]
    fn class_picks_template_and_directory() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let page = renderer.page(&album()).unwrap();
        assert_eq!(
            page.path,
            dir.path().join("releases").join("lp-ep").join("blue-hour.html")
        );
        assert_eq!(page.html, "<h1>Blue Hour</h1>Live &lt;at&gt; home");
    }

    #[test]
    fn title_image_replaces_text() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let titles = site(&dir).titles_dir();
        fs::create_dir_all(&titles).unwrap();
        fs::write(titles.join("glow-fade.png"), b"png").unwrap();
        let page = renderer.page(&single()).unwrap();
        assert!(page
            .html
            .starts_with("<h1><img src=\"/assets/img/titles/glow-fade.png\" alt=\"Glow &amp; Fade\""));
        let card = renderer.card(&single()).unwrap();
        assert!(card.title_html.contains("alt=\"Glow &amp; Fade Title\""));
    }

    #[test]
    fn rendering_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let page = renderer.page(&single()).unwrap();
        renderer.write(&page).unwrap();
        let first = fs::read(&page.path).unwrap();
        renderer.write(&renderer.page(&single()).unwrap()).unwrap();
        assert_eq!(fs::read(&page.path).unwrap(), first);
    }

    #[test]
    fn unusable_releases_are_reported() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let mut untitled = single();
        untitled.title = "???".to_string();
        assert!(matches!(
            renderer.page(&untitled),
            Err(RenderError::EmptySlug(_))
        ));

        fs::remove_file(site(&dir).templates_dir().join("album_template.html")).unwrap();
        let renderer = Renderer::new(&site(&dir));
        assert!(matches!(
            renderer.page(&album()),
            Err(RenderError::MissingTemplate(ReleaseClass::Album))
        ));
    }

    #[test]
    fn publish_counts_and_updates_gallery() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let catalogue = site(&dir).catalogue_path();
        fs::write(&catalogue, "<!-- DISC_START -->\n<!-- DISC_END -->").unwrap();
        let mut untitled = single();
        untitled.title = "!!!".to_string();

        let res = renderer.publish(&[single(), album(), untitled]);
        assert_eq!(
            res,
            Published {
                pages: 2,
                skipped: 1,
                failures: 0,
                catalogue_updated: true,
            }
        );
        let doc = fs::read_to_string(&catalogue).unwrap();
        let glow = doc.find("/releases/singles/glow-fade.html").unwrap();
        let blue = doc.find("/releases/lp-ep/blue-hour.html").unwrap();
        assert!(glow < blue);
    }

    #[test]
    fn publish_without_catalogue_still_writes_pages() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let res = renderer.publish(&[single()]);
        assert_eq!(res.pages, 1);
        assert_eq!(res.failures, 0);
        assert!(!res.catalogue_updated);
    }

    #[test]
    fn gallery_only_lists_written_pages() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);
        setup(&dir);
        fs::remove_file(site.templates_dir().join("album_template.html")).unwrap();
        let renderer = Renderer::new(&site);
        fs::write(site.catalogue_path(), "<!-- DISC_START --><!-- DISC_END -->").unwrap();

        let res = renderer.publish(&[album(), single()]);
        assert_eq!(res.pages, 1);
        assert_eq!(res.failures, 1);
        let doc = fs::read_to_string(site.catalogue_path()).unwrap();
        assert!(doc.contains("/releases/singles/glow-fade.html"));
        assert!(!doc.contains("blue-hour"));
        assert!(!site.releases_dir().join("lp-ep").join("blue-hour.html").exists());
    }

    #[test]
    fn colliding_slugs_keep_the_first_page() {
        let dir = TempDir::new().unwrap();
        let renderer = setup(&dir);
        let catalogue = site(&dir).catalogue_path();
        fs::write(&catalogue, "<!-- DISC_START --><!-- DISC_END -->").unwrap();
        let mut other = single();
        other.title = "Glow & Fade!".to_string();

        let res = renderer.publish(&[single(), other]);
        assert_eq!(res.pages, 1);
        assert_eq!(res.skipped, 1);
        assert_eq!(res.failures, 0);
        let page = fs::read_to_string(
            dir.path().join("releases").join("singles").join("glow-fade.html"),
        )
        .unwrap();
        assert!(page.contains(">Glow &amp; Fade</span>"));
        let doc = fs::read_to_string(&catalogue).unwrap();
        assert_eq!(doc.matches("gallery-item").count(), 1);
    }
}
