use std::time::Duration;
use strum_macros::{AsRefStr, Display, EnumString};
use time::Date;

use base::util::{parse_date, slugify};

#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReleaseType {
    Single,
    Ep,
    Album,
    #[default]
    Unknown,
}

impl ReleaseType {
    pub fn is_known(&self) -> bool {
        *self != ReleaseType::Unknown
    }

    /// Two types can describe the same release unless both are known and
    /// disagree.
    pub fn compatible(&self, other: &Self) -> bool {
        !self.is_known() || !other.is_known() || self == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Provider {
    Spotify,
    Bandcamp,
}

impl Provider {
    /// Higher wins when both sides of a merge carry an embedded player.
    pub fn embed_priority(&self) -> u8 {
        match self {
            Provider::Bandcamp => 2,
            Provider::Spotify => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub provider: Provider,
    pub markup: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub length: Option<Duration>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub title: String,
    pub kind: ReleaseType,
    pub tracks: Vec<Track>,
    pub cover_url: Option<String>,
    pub streaming_url: Option<String>,
    pub store_url: Option<String>,
    pub description: Option<String>,
    // kept as the provider wrote it, see `date`
    pub release_date: Option<String>,
    pub embed: Option<Embed>,
}

impl Release {
    pub fn total_length(&self) -> Duration {
        self.tracks.iter().filter_map(|t| t.length).sum()
    }

    pub fn date(&self) -> Option<Date> {
        self.release_date.as_deref().and_then(parse_date)
    }

    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn class(&self) -> ReleaseClass {
        ReleaseClass::of(self.tracks.len())
    }
}

/// Page layout bucket. Decided by track count alone, so an EP with three
/// tracks is laid out like a single.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ReleaseClass {
    Album,
    Single,
}

impl ReleaseClass {
    pub fn of(track_count: usize) -> Self {
        if track_count > 3 {
            ReleaseClass::Album
        } else {
            ReleaseClass::Single
        }
    }

    pub fn directory(&self) -> &'static str {
        match self {
            ReleaseClass::Album => "lp-ep",
            ReleaseClass::Single => "singles",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            ReleaseClass::Album => "album_template.html",
            ReleaseClass::Single => "single_template.html",
        }
    }
}
