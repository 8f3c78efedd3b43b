use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::release::Track;

static NOISE_WORDS: &[&str] = &["demo", "remaster", "remastered", "version", "ep", "single"];

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[-_\s]+").unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"[^\p{Alphabetic}\p{Nd}\s]").unwrap();
}

/// Comparison key for a title. Only ever compared, never displayed.
pub fn normalize(title: &str) -> String {
    let lower = title.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lower, " ");
    let stripped = PUNCTUATION.replace_all(&spaced, "");
    stripped
        .split_whitespace()
        .filter(|word| !NOISE_WORDS.contains(word))
        .join(" ")
}

pub fn normalize_tracks(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| normalize(&t.title)).collect()
}
