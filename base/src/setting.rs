use directories::ProjectDirs;
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::{CLI_NAME, SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not locate program directories")]
    NoProjectDirs,

    #[error("Could not read config file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub spotify: SpotifyConnection,
    #[serde(default)]
    pub bandcamp: BandcampConnection,
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub http: Http,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyConnection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_spotify_artist")]
    pub artist_id: String,
    // Usually left empty in the file and provided through the environment
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_spotify_token_url")]
    pub token_url: url::Url,
    #[serde(default = "default_spotify_api_url")]
    pub api_url: url::Url,
}

impl Default for SpotifyConnection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            artist_id: default_spotify_artist(),
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_spotify_token_url(),
            api_url: default_spotify_api_url(),
        }
    }
}

fn default_spotify_artist() -> String {
    "7aOzfiyPyb1w6s6If52cpg".to_string()
}

fn default_spotify_token_url() -> url::Url {
    url::Url::parse("https://accounts.spotify.com/api/token").unwrap()
}

fn default_spotify_api_url() -> url::Url {
    url::Url::parse("https://api.spotify.com/v1/").unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandcampConnection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bandcamp_url")]
    pub url: url::Url,
}

impl Default for BandcampConnection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            url: default_bandcamp_url(),
        }
    }
}

fn default_bandcamp_url() -> url::Url {
    url::Url::parse("https://kaifathers.bandcamp.com/").unwrap()
}

/// Locations of the templates and of every generated artifact. Relative
/// paths are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    #[serde(default = "default_releases")]
    pub releases: PathBuf,
    #[serde(default = "default_catalogue")]
    pub catalogue: PathBuf,
    #[serde(default = "default_titles")]
    pub titles: PathBuf,
    #[serde(default = "default_dump")]
    pub dump: PathBuf,
    #[serde(default)]
    pub source_dumps: bool,
    #[serde(default = "default_releases_link")]
    pub releases_link: String,
    #[serde(default = "default_titles_link")]
    pub titles_link: String,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            root: default_root(),
            templates: default_templates(),
            releases: default_releases(),
            catalogue: default_catalogue(),
            titles: default_titles(),
            dump: default_dump(),
            source_dumps: false,
            releases_link: default_releases_link(),
            titles_link: default_titles_link(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_releases() -> PathBuf {
    PathBuf::from("releases")
}

fn default_catalogue() -> PathBuf {
    PathBuf::from("discography.html")
}

fn default_titles() -> PathBuf {
    PathBuf::from("assets/img/titles")
}

fn default_dump() -> PathBuf {
    PathBuf::from("releases.txt")
}

fn default_releases_link() -> String {
    "/releases".to_string()
}

fn default_titles_link() -> String {
    "/assets/img/titles".to_string()
}

impl Site {
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.root.join(path)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve(&self.templates)
    }

    pub fn releases_dir(&self) -> PathBuf {
        self.resolve(&self.releases)
    }

    pub fn catalogue_path(&self) -> PathBuf {
        self.resolve(&self.catalogue)
    }

    pub fn titles_dir(&self) -> PathBuf {
        self.resolve(&self.titles)
    }

    pub fn dump_path(&self) -> PathBuf {
        self.resolve(&self.dump)
    }

    /// Debug dump of one provider's raw output, next to the main dump.
    pub fn source_dump_path(&self, source: &str) -> PathBuf {
        let stem = self
            .dump
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "releases".to_string());
        let name = format!("{}_{}.txt", stem, source.to_lowercase());
        self.resolve(self.dump.with_file_name(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Http {
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout() -> u64 {
    20
}

fn default_concurrency() -> usize {
    4
}

impl Http {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

pub fn default_path() -> Result<PathBuf, SettingsError> {
    let dirs =
        ProjectDirs::from("com", "github", CLI_NAME).ok_or(SettingsError::NoProjectDirs)?;
    Ok(dirs.config_dir().join(PathBuf::from("config.toml")))
}

pub fn load(path: Option<PathBuf>) -> Result<Settings, SettingsError> {
    let (path, explicit) = match path {
        Some(p) => (p, true),
        None => (default_path()?, false),
    };
    tracing::info! {?path, "Loading config file"};
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        // only an explicitly requested file has to exist
        Err(e) if explicit => return Err(SettingsError::Read(path, e)),
        Err(_) => String::new(),
    };
    let mut set: Settings = toml::from_str(content.as_str())?;
    set = apply_env(set, |k| env::var(k).ok());
    tracing::trace! {settings = ?set.site, "Loaded settings"};
    Ok(set)
}

/// Credentials found in the environment take precedence over the file.
pub fn apply_env<F>(mut set: Settings, var: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(id) = var(SPOTIFY_CLIENT_ID).filter(|v| !v.is_empty()) {
        set.spotify.client_id = id;
    }
    if let Some(secret) = var(SPOTIFY_CLIENT_SECRET).filter(|v| !v.is_empty()) {
        set.spotify.client_secret = secret;
    }
    set
}

pub fn print(set: &Settings) -> Result<String, SettingsError> {
    Ok(toml::to_string(set)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let set: Settings = toml::from_str("").unwrap();
        assert_eq!(set, Settings::default());
        assert_eq!(set.http.timeout(), Duration::from_secs(20));
        assert!(set.spotify.enabled);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let set: Settings = toml::from_str(
            r#"
            [site]
            root = "/srv/www"
            source_dumps = true

            [bandcamp]
            url = "https://example.bandcamp.com/"
            "#,
        )
        .unwrap();
        assert_eq!(set.site.root, PathBuf::from("/srv/www"));
        assert_eq!(set.site.releases_dir(), PathBuf::from("/srv/www/releases"));
        assert!(set.site.source_dumps);
        assert_eq!(set.bandcamp.url.as_str(), "https://example.bandcamp.com/");
        assert_eq!(set.spotify, SpotifyConnection::default());
    }

    #[test]
    fn environment_overrides_credentials() {
        let mut set = Settings::default();
        set.spotify.client_id = "from-file".to_string();
        let set = apply_env(set, |k| match k {
            SPOTIFY_CLIENT_ID => Some("from-env".to_string()),
            SPOTIFY_CLIENT_SECRET => Some(String::new()),
            _ => None,
        });
        assert_eq!(set.spotify.client_id, "from-env");
        assert_eq!(set.spotify.client_secret, "");
    }

    #[test]
    fn source_dumps_sit_next_to_main_dump() {
        let mut site = Site::default();
        site.dump = PathBuf::from("out/releases.txt");
        assert_eq!(
            site.source_dump_path("Spotify"),
            PathBuf::from("./out/releases_spotify.txt")
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let res = load(Some(dir.path().join("missing.toml")));
        assert!(matches!(res, Err(SettingsError::Read(_, _))));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[http]\nconcurrency = 8\n").unwrap();
        let set = load(Some(path)).unwrap();
        assert_eq!(set.http.concurrency, 8);
    }
}
