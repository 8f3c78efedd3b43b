use std::time::Instant;

use crate::dump;
use crate::fetch::{fetch_all, Source};
use crate::rank::reconcile;
use crate::release::{Provider, Release};
use crate::render::{Published, Renderer};
use base::setting::Site;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub fetched: Vec<(Provider, usize)>,
    pub releases: usize,
    pub dump_written: bool,
    /// `None` when pages were not rendered
    pub published: Option<Published>,
}

impl Report {
    pub fn failures(&self) -> usize {
        let dump = if self.dump_written { 0 } else { 1 };
        dump + self.published.as_ref().map(|p| p.failures).unwrap_or(0)
    }
}

/// Fetches every source, reconciles and classifies the results, writes the
/// text dump and, when `render` is set, the release pages and catalogue.
pub async fn run(sources: &[Box<dyn Source>], site: &Site, render: bool) -> Report {
    let start = Instant::now();
    let fetched = fetch_all(sources).await;
    let mut report = Report {
        fetched: fetched.iter().map(|(p, r)| (*p, r.len())).collect(),
        ..Default::default()
    };

    if site.source_dumps {
        for (provider, releases) in fetched.iter() {
            let path = site.source_dump_path(provider.as_ref());
            if let Err(error) = dump::write(&path, releases) {
                tracing::warn! {%provider, ?error, "Could not write source dump"};
            }
        }
    }

    let mut releases = reconcile(fetched.into_iter().map(|(_, r)| r).collect());
    releases.iter_mut().for_each(Release::resolve_kind);
    report.releases = releases.len();
    tracing::info! {count = releases.len(), "Reconciled releases"};

    match dump::write(&site.dump_path(), &releases) {
        Ok(()) => report.dump_written = true,
        Err(error) => tracing::error! {?error, "Could not write the release dump"},
    }
    if render {
        let renderer = Renderer::new(site);
        report.published = Some(renderer.publish(&releases));
    }
    tracing::debug! {elapsed = ?start.elapsed(), "Pipeline done"};
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{ReleaseType, Track};
    use async_trait::async_trait;
    use eyre::{bail, Result};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixed(Provider, Vec<Release>);

    #[async_trait]
    impl Source for Fixed {
        fn provider(&self) -> Provider {
            self.0
        }
        async fn releases(&self) -> Result<Vec<Release>> {
            Ok(self.1.clone())
        }
    }

    struct Down;

    #[async_trait]
    impl Source for Down {
        fn provider(&self) -> Provider {
            Provider::Spotify
        }
        async fn releases(&self) -> Result<Vec<Release>> {
            bail!("token endpoint unreachable")
        }
    }

    fn release(title: &str, kind: ReleaseType, tracks: usize, date: &str) -> Release {
        Release {
            title: title.to_string(),
            kind,
            tracks: (0..tracks)
                .map(|i| Track {
                    title: format!("{} {}", title, i),
                    length: Some(Duration::from_secs(240)),
                })
                .collect(),
            release_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn site(dir: &TempDir) -> Site {
        let site = Site {
            root: dir.path().to_path_buf(),
            source_dumps: true,
            ..Default::default()
        };
        fs::create_dir_all(site.templates_dir()).unwrap();
        for name in ["album_template.html", "single_template.html"] {
            fs::write(site.templates_dir().join(name), "<h1>{{title}}</h1>").unwrap();
        }
        fs::write(
            site.catalogue_path(),
            "<body><!-- DISC_START --><!-- DISC_END --></body>",
        )
        .unwrap();
        site
    }

    #[tokio::test]
    async fn merges_classifies_and_publishes() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);
        let mut store_copy = release("Blue Hour (Demo)", ReleaseType::Unknown, 5, "03 Jul 2024 00:00:00 GMT");
        store_copy.store_url = Some("https://artist.bandcamp.com/album/blue-hour".to_string());
        let mut streaming = release("Blue Hour", ReleaseType::Album, 5, "2024-07-01");
        streaming.tracks = store_copy.tracks.clone();
        let sources: Vec<Box<dyn Source>> = vec![
            Box::new(Fixed(Provider::Spotify, vec![streaming])),
            Box::new(Fixed(
                Provider::Bandcamp,
                vec![store_copy, release("Glow", ReleaseType::Unknown, 1, "2023-01-01")],
            )),
        ];

        let report = run(&sources, &site, true).await;
        assert_eq!(
            report.fetched,
            vec![(Provider::Spotify, 1), (Provider::Bandcamp, 2)]
        );
        assert_eq!(report.releases, 2);
        let published = report.published.clone().unwrap();
        assert_eq!(published.pages, 2);
        assert!(published.catalogue_updated);
        assert!(report.dump_written);
        assert_eq!(report.failures(), 0);

        let dump = fs::read_to_string(site.dump_path()).unwrap();
        assert!(dump.starts_with("ALBUM: Blue Hour\n"));
        assert!(dump.contains("Bandcamp: https://artist.bandcamp.com/album/blue-hour"));
        assert!(dump.contains("SINGLE: Glow\n"));
        assert!(site.source_dump_path("bandcamp").exists());
        assert!(dir.path().join("releases/lp-ep/blue-hour.html").exists());
        assert!(dir.path().join("releases/singles/glow.html").exists());
    }

    #[tokio::test]
    async fn fetch_only_run_skips_rendering() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);
        let sources: Vec<Box<dyn Source>> = vec![
            Box::new(Down),
            Box::new(Fixed(
                Provider::Bandcamp,
                vec![release("Glow", ReleaseType::Unknown, 1, "2023-01-01")],
            )),
        ];
        let report = run(&sources, &site, false).await;
        assert_eq!(report.fetched[0], (Provider::Spotify, 0));
        assert_eq!(report.published, None);
        assert!(site.dump_path().exists());
        assert!(!dir.path().join("releases").exists());
    }

    #[tokio::test]
    async fn unwritable_dump_does_not_stop_publishing() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);
        // a directory where the dump file should go
        fs::create_dir_all(site.dump_path()).unwrap();
        let sources: Vec<Box<dyn Source>> = vec![Box::new(Fixed(
            Provider::Bandcamp,
            vec![release("Glow", ReleaseType::Unknown, 1, "2023-01-01")],
        ))];

        let report = run(&sources, &site, true).await;
        assert!(!report.dump_written);
        assert_eq!(report.published.as_ref().unwrap().pages, 1);
        assert_eq!(report.failures(), 1);
        assert!(dir.path().join("releases/singles/glow.html").exists());
    }
}
