use std::time::Duration;

use crate::release::{Release, ReleaseType};

static SINGLE_MAX_TRACKS: usize = 3;
static EP_MAX_TRACKS: usize = 6;
static EP_MAX_LENGTH: Duration = Duration::from_secs(30 * 60);

pub fn classify(track_count: usize, total_length: Duration) -> ReleaseType {
    if track_count <= SINGLE_MAX_TRACKS {
        ReleaseType::Single
    } else if track_count <= EP_MAX_TRACKS && total_length <= EP_MAX_LENGTH {
        ReleaseType::Ep
    } else {
        ReleaseType::Album
    }
}

impl Release {
    /// The provider reported type, or the classified one when missing.
    pub fn effective_kind(&self) -> ReleaseType {
        if self.kind.is_known() {
            self.kind
        } else {
            classify(self.tracks.len(), self.total_length())
        }
    }

    pub fn resolve_kind(&mut self) {
        if !self.kind.is_known() {
            self.kind = self.effective_kind();
            tracing::debug! {title = %self.title, kind = %self.kind, "Classified release"};
        }
    }
}
