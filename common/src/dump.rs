use eyre::{eyre, Result, WrapErr};
use std::fs;
use std::path::Path;

use crate::release::Release;
use base::util::{date_only, format_length, mkdirp, NOT_AVAILABLE};

static SEPARATOR: &str = "\n-----------------------------\n";

fn or_na(value: Option<&str>) -> &str {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

pub fn format_release(release: &Release) -> String {
    let date = release.release_date.as_deref().map(date_only);
    let mut out = format!(
        "{}: {}\nCover: {}\nSpotify: {}\nBandcamp: {}\nRelease Date: {}\nTracks:",
        release.kind.as_ref().to_uppercase(),
        release.title,
        or_na(release.cover_url.as_deref()),
        or_na(release.streaming_url.as_deref()),
        or_na(release.store_url.as_deref()),
        or_na(date.as_deref()),
    );
    if release.tracks.is_empty() {
        out.push_str(" N/A");
    }
    for track in release.tracks.iter() {
        out.push_str(format!("\n  - {} [{}]", track.title, format_length(track.length)).as_str());
    }
    out.push('\n');
    out
}

pub fn format_releases(releases: &[Release]) -> String {
    releases
        .iter()
        .map(format_release)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

pub fn write(path: &Path, releases: &[Release]) -> Result<()> {
    if let Some(parent) = path.parent() {
        mkdirp(parent).wrap_err(eyre!("Could not create directory {:?}", parent))?;
    }
    fs::write(path, format_releases(releases))
        .wrap_err(eyre!("Could not write release dump {:?}", path))?;
    tracing::info! {?path, count = releases.len(), "Wrote release dump"};
    Ok(())
}
