//! Gapless track layout.
//!
//! Both entry points share one cursor walk: starting at an anchor minute,
//! each entry in sequence is assigned the cursor as its start time and the
//! cursor advances by the entry's duration. The walk is diffed against the
//! stored values so only real changes are emitted.
//!
//! Only entries whose layout track matches are ever read or written. A
//! lane is never packed past the end of the day: the walk fails instead
//! of wrapping start times around midnight.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::Entry;
use crate::sequence::{get_track_anchor_start_minutes, sort_entries_by_time};
use crate::time::{MINUTES_PER_DAY, minutes_to_time_string};
use crate::types::{EntryId, TrackId};
use crate::update::EntryUpdate;

/// A packed lane would end after midnight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("track {track_id} would run until minute {end_minutes}, past the end of the day")]
pub struct PastMidnight {
    pub track_id: TrackId,
    pub end_minutes: i32,
}

/// Lays out a track in a caller-chosen order starting at `anchor_start_minutes`.
///
/// `ordered_entry_ids` is the desired sequence (e.g. after a drag). Ids not
/// on the track are ignored; track entries missing from the list follow the
/// listed ones in time order. Returns `{entry_id, start_time}` updates for
/// entries whose start time actually changes.
pub fn build_gapless_reorder_updates(
    all_entries: &[Entry],
    track_id: &TrackId,
    ordered_entry_ids: &[EntryId],
    anchor_start_minutes: i32,
) -> Result<Vec<EntryUpdate>, PastMidnight> {
    let sequence = impose_order(all_entries, track_id, ordered_entry_ids);
    walk(track_id, &sequence, anchor_start_minutes)
}

/// Repairs drift on a track by re-packing it in its current time order.
///
/// The anchor is the earliest stored start on the track; `fallback_anchor`
/// is only used when no entry on the track carries a start time. An
/// already-gapless track yields no updates.
pub fn build_gapless_normalize_start_time_updates(
    all_entries: &[Entry],
    track_id: &TrackId,
    fallback_anchor: i32,
) -> Result<Vec<EntryUpdate>, PastMidnight> {
    let sorted = sort_entries_by_time(on_track(all_entries, track_id));
    if sorted.is_empty() {
        return Ok(Vec::new());
    }
    let anchor = get_track_anchor_start_minutes(sorted.iter().copied()).unwrap_or(fallback_anchor);
    walk(track_id, &sorted, anchor)
}

/// Rewrites `order` to each entry's position in the caller-chosen sequence.
///
/// Used when time cascades are switched off: the sequence is still
/// persisted, but start times are left alone.
pub fn build_order_updates(
    all_entries: &[Entry],
    track_id: &TrackId,
    ordered_entry_ids: &[EntryId],
) -> Vec<EntryUpdate> {
    impose_order(all_entries, track_id, ordered_entry_ids)
        .into_iter()
        .zip(0_i64..)
        .filter(|(entry, position)| entry.order != Some(*position))
        .map(|(entry, position)| EntryUpdate::new(entry.id.clone()).with_order(position))
        .collect()
}

/// Returns true if the track's entries are contiguous in time order.
///
/// Untimed entries break contiguity, since they have not been placed yet.
pub fn is_gapless(all_entries: &[Entry], track_id: &TrackId) -> bool {
    let sorted = sort_entries_by_time(on_track(all_entries, track_id));
    sorted.iter().all(|e| e.start_minutes().is_some())
        && sorted
            .windows(2)
            .all(|pair| pair[0].end_minutes() == pair[1].start_minutes())
}

fn on_track<'a>(all_entries: &'a [Entry], track_id: &TrackId) -> impl Iterator<Item = &'a Entry> {
    all_entries
        .iter()
        .filter(move |e| e.layout_track_id() == track_id)
}

fn impose_order<'a>(
    all_entries: &'a [Entry],
    track_id: &TrackId,
    ordered_entry_ids: &[EntryId],
) -> Vec<&'a Entry> {
    let track_entries: Vec<&Entry> = on_track(all_entries, track_id).collect();
    let mut placed: HashSet<&EntryId> = HashSet::new();
    let mut sequence = Vec::with_capacity(track_entries.len());

    for id in ordered_entry_ids {
        if let Some(&entry) = track_entries.iter().find(|e| &e.id == id) {
            if placed.insert(&entry.id) {
                sequence.push(entry);
            }
        }
    }

    let leftovers = track_entries
        .iter()
        .copied()
        .filter(|e| !placed.contains(&e.id));
    sequence.extend(sort_entries_by_time(leftovers));
    sequence
}

fn walk(
    track_id: &TrackId,
    sequence: &[&Entry],
    anchor_start_minutes: i32,
) -> Result<Vec<EntryUpdate>, PastMidnight> {
    let mut cursor = anchor_start_minutes;
    let mut updates = Vec::new();

    for entry in sequence {
        let end = cursor.saturating_add(entry.duration_minutes());
        if cursor < 0 || end > MINUTES_PER_DAY {
            tracing::warn!(%track_id, entry_id = %entry.id, end, "layout runs past midnight");
            return Err(PastMidnight {
                track_id: track_id.clone(),
                end_minutes: end,
            });
        }
        let start_time = minutes_to_time_string(cursor);
        if entry.start_time.as_deref() != Some(start_time.as_str()) {
            updates.push(EntryUpdate::new(entry.id.clone()).with_start_time(start_time));
        }
        cursor = end;
    }

    Ok(updates)
}
