use base::util::NOT_AVAILABLE;

use crate::release::{Embed, Release};

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != NOT_AVAILABLE
    })
}

fn prefer(primary: Option<String>, secondary: Option<String>) -> Option<String> {
    present(primary).or_else(|| present(secondary))
}

fn prefer_embed(primary: Option<Embed>, secondary: Option<Embed>) -> Option<Embed> {
    let usable = |e: &Embed| !e.markup.trim().is_empty();
    match (primary.filter(usable), secondary.filter(usable)) {
        (Some(p), Some(s)) if s.provider.embed_priority() > p.provider.embed_priority() => Some(s),
        (p, s) => p.or(s),
    }
}

impl Release {
    /// Combines two records of the same release. `self` is the primary
    /// side: it wins every field it has a usable value for, except the
    /// embedded player, which goes to the higher priority provider.
    pub fn merge(self, other: Release) -> Release {
        Release {
            title: if self.title.trim().is_empty() {
                other.title
            } else {
                self.title
            },
            kind: if self.kind.is_known() {
                self.kind
            } else {
                other.kind
            },
            tracks: if self.tracks.is_empty() {
                other.tracks
            } else {
                self.tracks
            },
            cover_url: prefer(self.cover_url, other.cover_url),
            streaming_url: prefer(self.streaming_url, other.streaming_url),
            store_url: prefer(self.store_url, other.store_url),
            description: prefer(self.description, other.description),
            release_date: prefer(self.release_date, other.release_date),
            embed: prefer_embed(self.embed, other.embed),
        }
    }
}
