mod classify;
mod matching;
mod merge;
mod normalize;

pub use classify::classify;
pub use matching::{reconcile, same_release, DATE_TOLERANCE_DAYS};
pub use normalize::{normalize, normalize_tracks};

fn if_both<T, R>(a: Option<T>, b: Option<T>, then: impl Fn(T, T) -> R) -> Option<R> {
    if let Some(a_val) = a {
        if let Some(b_val) = b {
            return Some(then(a_val, b_val));
        }
    }
    None
}
