use std::cmp::Reverse;
use std::fs;
use std::path::Path;

use super::{escape, RenderError};

pub static DISC_START: &str = "<!-- DISC_START -->";
pub static DISC_END: &str = "<!-- DISC_END -->";

/// One gallery entry. Everything but `title_html` is plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub link: String,
    pub cover: String,
    pub title: String,
    pub title_html: String,
    pub date: Option<time::Date>,
}

impl Card {
    fn html(&self) -> String {
        format!(
            "<div class=\"gallery-item\"><a href=\"{}\">\n      <div class=\"img-container\"><img src=\"{}\" alt=\"{} Cover\"></div>\n      <p class=\"album-title\">{}</p>\n    </a></div>",
            escape(&self.link),
            escape(&self.cover),
            escape(&self.title),
            self.title_html
        )
    }
}

/// Newest first. Cards without a date go last and ties keep their order.
pub fn sort_cards(cards: &mut [Card]) {
    // None < Some, so reversing puts undated cards at the end
    cards.sort_by_key(|c| Reverse(c.date));
}

/// Replaces whatever sits between the gallery markers. `None` when the
/// markers are missing or out of order.
pub fn rewrite_gallery(doc: &str, cards: &[Card]) -> Option<String> {
    let start = doc.find(DISC_START)? + DISC_START.len();
    let end = doc[start..].find(DISC_END)? + start;
    let gallery = cards.iter().map(Card::html).collect::<Vec<_>>().join("\n");
    Some(format!("{}\n{}\n{}", &doc[..start], gallery, &doc[end..]))
}

/// Rewrites the gallery of the catalogue page in place. Returns whether
/// the file changed.
pub fn update_catalogue(path: &Path, mut cards: Vec<Card>) -> Result<bool, RenderError> {
    let doc = fs::read_to_string(path).map_err(|e| RenderError::Read(path.to_path_buf(), e))?;
    sort_cards(&mut cards);
    let updated = match rewrite_gallery(doc.as_str(), &cards) {
        Some(u) => u,
        None => return Err(RenderError::MissingMarkers(path.to_path_buf())),
    };
    if updated == doc {
        tracing::debug! {?path, "Catalogue already up to date"};
        return Ok(false);
    }
    fs::write(path, updated).map_err(|e| RenderError::Write(path.to_path_buf(), e))?;
    tracing::info! {?path, cards = cards.len(), "Updated catalogue gallery"};
    Ok(true)
}
