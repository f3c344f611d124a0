//! Time ordering of entries and track anchor resolution.

use std::cmp::Ordering;

use crate::model::Entry;

/// Sorts entries by effective start minute, then by `order`.
///
/// The sort is stable, so entries sharing both keys keep their input order
/// and sorting an already-sorted sequence returns it unchanged. Entries
/// without a usable start time follow every timed entry and are ordered
/// among themselves by `order`; a missing `order` sorts after a present one.
pub fn sort_entries_by_time<'a, I>(entries: I) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut sorted: Vec<&Entry> = entries.into_iter().collect();
    sorted.sort_by(|a, b| compare_by_time(a, b));
    sorted
}

/// Total order used by [`sort_entries_by_time`].
pub fn compare_by_time(a: &Entry, b: &Entry) -> Ordering {
    last_when_missing(a.start_minutes(), b.start_minutes())
        .then_with(|| last_when_missing(a.order, b.order))
}

fn last_when_missing<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns the minute a track's packed sequence should begin at.
///
/// This is the earliest start among the entries that carry one, so a track
/// re-anchors to whatever is currently first. `None` means the caller must
/// supply a fallback (the day start, or a dropped entry's own time).
pub fn get_track_anchor_start_minutes<'a, I>(track_entries: I) -> Option<i32>
where
    I: IntoIterator<Item = &'a Entry>,
{
    track_entries
        .into_iter()
        .filter_map(Entry::start_minutes)
        .min()
}
