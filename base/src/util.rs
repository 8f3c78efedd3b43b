use lazy_static::lazy_static;
use std::fs::create_dir_all;
use std::io;
use std::path::Path;
use std::time::Duration;
use time::{format_description::FormatItem, macros::format_description, parsing::Parsed};
use time::{Date, Month};

pub const NOT_AVAILABLE: &str = "N/A";

pub fn mkdirp<P: AsRef<Path>>(path: P) -> io::Result<()> {
    if let Err(e) = create_dir_all(path) {
        if e.kind() != io::ErrorKind::AlreadyExists {
            return Err(e);
        }
    }
    Ok(())
}

/// Filesystem and URL safe form of a title: lowercase ASCII alphanumerics
/// separated by single hyphens. Every other character is dropped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

/// Formats a track length as `m:ss`, or `N/A` when unknown.
pub fn format_length(length: Option<Duration>) -> String {
    match length {
        Some(l) => {
            let secs = l.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

lazy_static! {
    static ref DATE_FORMAT: &'static [FormatItem<'static>] =
        format_description!("[year][optional [-[month]]][optional [-[day]]]");
    static ref VERBOSE_DATE_FORMATS: [&'static [FormatItem<'static>]; 2] = [
        format_description!("[day padding:none] [month repr:short] [year]"),
        format_description!("[day] [month repr:short] [year]"),
    ];
}

fn is_verbose(tokens: &[&str]) -> bool {
    tokens.len() >= 3 && tokens[1].chars().all(|c| c.is_ascii_alphabetic())
}

/// Strips the time of day and timezone from a provider date, keeping the
/// text of the date itself. Handles `2024-07-30T18:00:00Z` (-> `2024-07-30`)
/// and `24 Jul 2025 18:00:30 GMT` (-> `24 Jul 2025`).
pub fn date_only(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if is_verbose(&tokens) {
        return tokens[..3].join(" ");
    }
    tokens
        .first()
        .and_then(|t| t.split('T').next())
        .unwrap_or_default()
        .to_string()
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct OptionalDate {
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub day: Option<u8>,
}

impl OptionalDate {
    /// Missing month or day fall back to the first one.
    pub fn to_date(self) -> Option<Date> {
        let month = Month::try_from(self.month.unwrap_or(1)).ok()?;
        Date::from_calendar_date(self.year?, month, self.day.unwrap_or(1)).ok()
    }
}

pub fn maybe_date(d: Option<&str>) -> OptionalDate {
    if let Some(s) = d {
        let mut parsed = Parsed::new();
        let parse_result = parsed.parse_items(s.as_bytes(), *DATE_FORMAT);
        let res = OptionalDate {
            year: parsed.year(),
            month: parsed.month().map(|m| m as u8),
            day: parsed.day().map(|d| d.get()),
        };
        tracing::trace!(date = %s, ?res, ?parse_result, "Parsed date");
        res
    } else {
        OptionalDate::default()
    }
}

/// Parses the calendar date out of either supported provider format.
pub fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = date_only(raw);
    if trimmed.is_empty() {
        return None;
    }
    if is_verbose(&trimmed.split(' ').collect::<Vec<_>>()) {
        return VERBOSE_DATE_FORMATS
            .iter()
            .find_map(|format| Date::parse(trimmed.as_str(), *format).ok());
    }
    maybe_date(Some(trimmed.as_str())).to_date()
}
