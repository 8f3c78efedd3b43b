use super::{if_both, normalize, normalize_tracks};
use crate::release::{Release, ReleaseType};

pub static DATE_TOLERANCE_DAYS: i64 = 7;

/// Whether two records describe the same release. Symmetric in its
/// arguments.
pub fn same_release(a: &Release, b: &Release) -> bool {
    // an empty track list would match anything with the same title
    if a.tracks.is_empty() || b.tracks.is_empty() {
        return false;
    }
    if !a.kind.compatible(&b.kind) {
        return false;
    }
    if normalize(&a.title) != normalize(&b.title) {
        return false;
    }

    let (tracks_a, tracks_b) = (normalize_tracks(&a.tracks), normalize_tracks(&b.tracks));
    if tracks_a == tracks_b {
        return true;
    }
    if a.effective_kind() == ReleaseType::Single
        && b.effective_kind() == ReleaseType::Single
        && tracks_a.first() == tracks_b.first()
    {
        return true;
    }
    tracks_a.len() == tracks_b.len()
        && if_both(a.date(), b.date(), |d1, d2| {
            (d1 - d2).whole_days().abs() <= DATE_TOLERANCE_DAYS
        })
        .unwrap_or(false)
}

/// Folds the per-provider lists into canonical records. The first list is
/// the primary source and is taken as-is; every record of the following
/// lists is merged into the first accepted record it matches, or kept as a
/// distinct release.
pub fn reconcile(sources: Vec<Vec<Release>>) -> Vec<Release> {
    let mut sources = sources.into_iter();
    let mut accepted = sources.next().unwrap_or_default();
    for candidate in sources.flatten() {
        match accepted.iter().position(|r| same_release(r, &candidate)) {
            Some(i) => {
                tracing::debug! {title = %candidate.title, into = %accepted[i].title, "Merging duplicate release"};
                let primary = std::mem::take(&mut accepted[i]);
                accepted[i] = primary.merge(candidate);
            }
            None => {
                tracing::trace! {title = %candidate.title, "Keeping distinct release"};
                accepted.push(candidate)
            }
        }
    }
    accepted
}
