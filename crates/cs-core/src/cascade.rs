//! User-facing cascade operations.
//!
//! Each operation computes one merged [`ScheduleBatch`] from an immutable
//! [`DaySchedule`] snapshot. The `plan_*` functions only compute; the
//! [`CascadeCoordinator`] additionally hands a non-empty batch to its
//! [`BatchPersistence`] port, exactly once per action.

use std::collections::HashSet;

use thiserror::Error;

use crate::layout::{
    PastMidnight, build_gapless_normalize_start_time_updates, build_gapless_reorder_updates,
    build_order_updates,
};
use crate::model::{DaySchedule, Entry};
use crate::sequence::{get_track_anchor_start_minutes, sort_entries_by_time};
use crate::time::{MINUTES_PER_DAY, minutes_to_time_string, parse_time_to_minutes};
use crate::types::{EntryId, TrackId};
use crate::update::{EntryUpdate, ScheduleBatch, UpdateSet};

/// Per-call cascade settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeConfig {
    /// When false, edits never recompute start times.
    pub enabled: bool,

    /// Anchor used for empty tracks when the day has no start time set.
    /// Default: 420 (07:00).
    pub default_day_start_minutes: i32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_day_start_minutes: 7 * 60,
        }
    }
}

/// Errors raised by cascade operations.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// The edited entry is not in the snapshot.
    #[error("entry not found: {0}")]
    UnknownEntry(EntryId),

    /// Entries can only be moved onto lanes.
    #[error("track {0} is not a lane")]
    NotALane(TrackId),

    /// The requested day start is not a valid `HH:MM` time.
    #[error("invalid start time: {0:?}")]
    InvalidTime(String),

    /// Shifting the day would push entries outside of the day.
    #[error(
        "cannot shift schedule by {delta} minutes: entries would span minute {} to {}, outside 0..=1440",
        earliest + delta,
        latest + delta
    )]
    OutOfRange {
        earliest: i32,
        latest: i32,
        delta: i32,
    },

    /// Packing a lane would push its last entry past midnight.
    #[error(transparent)]
    PastMidnight(#[from] PastMidnight),

    /// The persistence port rejected the batch.
    #[error("failed to persist schedule batch")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Port through which computed batches are persisted.
pub trait BatchPersistence {
    /// Error reported by the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Applies every change in `batch` as one unit.
    fn apply_batch(&mut self, batch: &ScheduleBatch) -> Result<(), Self::Error>;
}

/// Result of a coordinator operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// Nothing needed to be written.
    Unchanged,
    /// The batch was handed to the port.
    Submitted(ScheduleBatch),
}

/// Runs cascade operations and submits their batches to a persistence port.
#[derive(Debug)]
pub struct CascadeCoordinator<P> {
    port: P,
}

impl<P: BatchPersistence> CascadeCoordinator<P> {
    pub const fn new(port: P) -> Self {
        Self { port }
    }

    /// Returns the persistence port.
    pub const fn port(&self) -> &P {
        &self.port
    }

    /// Consumes the coordinator, returning the port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Moves an entry within the time-sorted day view and re-packs its track.
    pub fn reorder_entries(
        &mut self,
        day: &DaySchedule,
        entry_id: &EntryId,
        old_index: usize,
        new_index: usize,
        config: &CascadeConfig,
    ) -> Result<CascadeOutcome, CascadeError> {
        let batch = plan_reorder(day, entry_id, old_index, new_index, config)?;
        self.submit(batch)
    }

    /// Moves an entry onto another lane and re-packs both lanes.
    pub fn move_entry_to_track(
        &mut self,
        day: &DaySchedule,
        entry_id: &EntryId,
        new_track_id: &TrackId,
        config: &CascadeConfig,
    ) -> Result<CascadeOutcome, CascadeError> {
        let batch = plan_move(day, entry_id, new_track_id, config)?;
        self.submit(batch)
    }

    /// Changes the day start, shifting every entry by the same delta.
    pub fn set_day_start_time(
        &mut self,
        day: &DaySchedule,
        next_start_time: &str,
        config: &CascadeConfig,
    ) -> Result<CascadeOutcome, CascadeError> {
        let batch = plan_day_start_shift(day, next_start_time, config)?;
        self.submit(batch)
    }

    /// Re-packs every lane of a freshly loaded day.
    pub fn normalize_day(
        &mut self,
        day: &DaySchedule,
        config: &CascadeConfig,
    ) -> Result<CascadeOutcome, CascadeError> {
        let batch = plan_normalize(day, config);
        self.submit(batch)
    }

    fn submit(&mut self, batch: ScheduleBatch) -> Result<CascadeOutcome, CascadeError> {
        if batch.is_empty() {
            tracing::debug!("empty batch, nothing to persist");
            return Ok(CascadeOutcome::Unchanged);
        }
        self.port
            .apply_batch(&batch)
            .map_err(|e| CascadeError::Persistence(Box::new(e)))?;
        tracing::info!(
            updates = batch.updates.len(),
            day_start_time = ?batch.day_start_time,
            "submitted schedule batch"
        );
        Ok(CascadeOutcome::Submitted(batch))
    }
}

/// Computes the batch for dragging an entry from `old_index` to `new_index`
/// of the time-sorted view of all entries.
///
/// A stale or out-of-bounds `old_index` resolves to the entry's actual
/// position; `new_index` clamps to the last position. The track keeps the
/// anchor it had before the move.
pub fn plan_reorder(
    day: &DaySchedule,
    entry_id: &EntryId,
    old_index: usize,
    new_index: usize,
    config: &CascadeConfig,
) -> Result<ScheduleBatch, CascadeError> {
    let moved = find_entry(day, entry_id)?;
    if old_index == new_index {
        return Ok(ScheduleBatch::default());
    }

    let track_id = moved.layout_track_id().clone();
    if !day.is_lane(&track_id) {
        tracing::debug!(%entry_id, %track_id, "banner reorder does not cascade");
        return Ok(ScheduleBatch::default());
    }

    let mut global: Vec<&EntryId> = sort_entries_by_time(&day.entries)
        .into_iter()
        .map(|e| &e.id)
        .collect();
    let last = global.len() - 1;
    let from = if global.get(old_index) == Some(&entry_id) {
        old_index
    } else {
        let actual = global.iter().position(|id| *id == entry_id).unwrap_or(old_index.min(last));
        tracing::debug!(%entry_id, old_index, actual, "stale reorder index");
        actual
    };
    let to = new_index.min(last);
    if from == to {
        return Ok(ScheduleBatch::default());
    }

    let id = global.remove(from);
    global.insert(to, id);

    let track_entries = day.entries_on(&track_id);
    let members: HashSet<&EntryId> = track_entries.iter().map(|e| &e.id).collect();
    let ordered: Vec<EntryId> = global
        .into_iter()
        .filter(|id| members.contains(id))
        .cloned()
        .collect();

    let updates = if config.enabled {
        let anchor = get_track_anchor_start_minutes(track_entries.iter().copied())
            .unwrap_or_else(|| fallback_anchor(day, config));
        build_gapless_reorder_updates(&day.entries, &track_id, &ordered, anchor)?
    } else {
        build_order_updates(&day.entries, &track_id, &ordered)
    };

    tracing::debug!(%entry_id, %track_id, from, to, updates = updates.len(), "planned reorder");
    Ok(ScheduleBatch::from_updates(updates.into_iter().collect()))
}

/// Computes the batch for moving an entry onto `new_track_id`.
///
/// The source lane keeps its pre-move anchor. The destination lane keeps
/// its own anchor, or inherits the moved entry's start when it is empty.
/// Single-lane banners are re-addressed through their applicability list
/// instead of their track id.
pub fn plan_move(
    day: &DaySchedule,
    entry_id: &EntryId,
    new_track_id: &TrackId,
    config: &CascadeConfig,
) -> Result<ScheduleBatch, CascadeError> {
    let moved = find_entry(day, entry_id)?;
    if !day.is_lane(new_track_id) {
        return Err(CascadeError::NotALane(new_track_id.clone()));
    }

    let source_id = moved.layout_track_id().clone();
    if &source_id == new_track_id {
        return Ok(ScheduleBatch::default());
    }

    let reassignment = if moved.is_single_lane_banner() {
        EntryUpdate::new(entry_id.clone()).with_applies_to(vec![new_track_id.clone()])
    } else {
        EntryUpdate::new(entry_id.clone()).with_track_id(new_track_id.clone())
    };

    let mut merged = UpdateSet::new();
    merged.merge(reassignment.clone());
    if !config.enabled {
        return Ok(ScheduleBatch::from_updates(merged));
    }

    let fallback = fallback_anchor(day, config);
    let source_anchor =
        get_track_anchor_start_minutes(day.entries_on(&source_id)).unwrap_or(fallback);
    let destination_anchor = get_track_anchor_start_minutes(day.entries_on(new_track_id))
        .or_else(|| moved.start_minutes())
        .unwrap_or(fallback);

    let mut next: Vec<Entry> = day.entries.clone();
    if let Some(entry) = next.iter_mut().find(|e| &e.id == entry_id) {
        reassignment.apply_to(entry);
    }
    let sorted = sort_entries_by_time(&next);
    let order_on = |track_id: &TrackId| -> Vec<EntryId> {
        sorted
            .iter()
            .filter(|e| e.layout_track_id() == track_id)
            .map(|e| e.id.clone())
            .collect()
    };

    if day.is_lane(&source_id) {
        merged.extend(build_gapless_reorder_updates(
            &next,
            &source_id,
            &order_on(&source_id),
            source_anchor,
        )?);
    }
    merged.extend(build_gapless_reorder_updates(
        &next,
        new_track_id,
        &order_on(new_track_id),
        destination_anchor,
    )?);

    tracing::debug!(
        %entry_id,
        from = %source_id,
        to = %new_track_id,
        source_anchor,
        destination_anchor,
        updates = merged.len(),
        "planned cross-track move"
    );
    Ok(ScheduleBatch::from_updates(merged))
}

/// Computes the batch for changing the day start to `next_start_time`.
///
/// Every timed entry shifts by `next - earliest`. The shift is rejected
/// as a whole if any entry would leave the day.
pub fn plan_day_start_shift(
    day: &DaySchedule,
    next_start_time: &str,
    config: &CascadeConfig,
) -> Result<ScheduleBatch, CascadeError> {
    let next_minutes = parse_time_to_minutes(next_start_time)
        .ok_or_else(|| CascadeError::InvalidTime(next_start_time.to_string()))?;
    let canonical = minutes_to_time_string(next_minutes);
    let setting_only = || {
        if day.day_start_time.as_deref() == Some(canonical.as_str()) {
            ScheduleBatch::default()
        } else {
            ScheduleBatch {
                updates: Vec::new(),
                day_start_time: Some(canonical.clone()),
            }
        }
    };

    if !config.enabled {
        return Ok(setting_only());
    }

    let timed: Vec<(&Entry, i32)> = day
        .entries
        .iter()
        .filter_map(|e| e.start_minutes().map(|start| (e, start)))
        .collect();
    let Some(earliest) = timed.iter().map(|(_, start)| *start).min() else {
        return Ok(setting_only());
    };
    let latest = timed
        .iter()
        .map(|(e, start)| start + e.duration_minutes())
        .max()
        .unwrap_or(earliest);

    let delta = next_minutes - earliest;
    if delta == 0 {
        return Ok(setting_only());
    }
    if earliest + delta < 0 || latest + delta > MINUTES_PER_DAY {
        tracing::warn!(earliest, latest, delta, "rejected day start shift");
        return Err(CascadeError::OutOfRange {
            earliest,
            latest,
            delta,
        });
    }

    let updates: UpdateSet = timed
        .into_iter()
        .filter_map(|(entry, start)| {
            let shifted = minutes_to_time_string(start + delta);
            (entry.start_time.as_deref() != Some(shifted.as_str()))
                .then(|| EntryUpdate::new(entry.id.clone()).with_start_time(shifted))
        })
        .collect();

    tracing::debug!(delta, updates = updates.len(), "planned day start shift");
    Ok(ScheduleBatch {
        updates: updates.into_vec(),
        day_start_time: Some(canonical),
    })
}

/// Computes the batch that repairs drift on every lane of the day.
///
/// A lane that cannot be packed before midnight is left as stored.
pub fn plan_normalize(day: &DaySchedule, config: &CascadeConfig) -> ScheduleBatch {
    if !config.enabled {
        return ScheduleBatch::default();
    }
    let fallback = fallback_anchor(day, config);
    let mut updates = UpdateSet::new();
    for lane in day.lane_ids() {
        match build_gapless_normalize_start_time_updates(&day.entries, &lane, fallback) {
            Ok(lane_updates) => updates.extend(lane_updates),
            Err(err) => tracing::warn!(day = %day.id, %err, "skipped lane normalization"),
        }
    }
    tracing::debug!(day = %day.id, updates = updates.len(), "planned normalization");
    ScheduleBatch::from_updates(updates)
}

fn find_entry<'a>(day: &'a DaySchedule, entry_id: &EntryId) -> Result<&'a Entry, CascadeError> {
    day.entry(entry_id)
        .ok_or_else(|| CascadeError::UnknownEntry(entry_id.clone()))
}

fn fallback_anchor(day: &DaySchedule, config: &CascadeConfig) -> i32 {
    day.day_start_minutes()
        .unwrap_or(config.default_day_start_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::is_gapless;
    use crate::model::Track;
    use crate::types::DayId;

    #[derive(Debug, Error)]
    #[error("store offline")]
    struct Offline;

    #[derive(Default)]
    struct RecordingPort {
        batches: Vec<ScheduleBatch>,
        fail: bool,
    }

    impl BatchPersistence for RecordingPort {
        type Error = Offline;

        fn apply_batch(&mut self, batch: &ScheduleBatch) -> Result<(), Self::Error> {
            if self.fail {
                return Err(Offline);
            }
            self.batches.push(batch.clone());
            Ok(())
        }
    }

    fn entry(id: &str, track: &str, start: &str, duration: i64) -> Entry {
        Entry::new(
            EntryId::new(id).unwrap(),
            TrackId::new(track).unwrap(),
            Some(start),
            duration,
        )
    }

    fn day(entries: Vec<Entry>) -> DaySchedule {
        let mut day = DaySchedule::new(DayId::new("day-1").unwrap());
        day.tracks = vec![
            Track::lane(TrackId::new("t1").unwrap(), "Photo"),
            Track::lane(TrackId::new("t2").unwrap(), "Video"),
            Track::shared(TrackId::new("shared").unwrap(), "All"),
        ];
        day.entries = entries;
        day
    }

    fn eid(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    fn tid(s: &str) -> TrackId {
        TrackId::new(s).unwrap()
    }

    fn summary(batch: &ScheduleBatch) -> Vec<String> {
        batch
            .updates
            .iter()
            .map(|u| serde_json::to_string(u).unwrap())
            .collect()
    }

    #[test]
    fn reorder_within_track() {
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 15),
            entry("B", "t1", "09:15", 15),
            entry("C", "t1", "09:30", 15),
        ]);
        let batch = plan_reorder(&snapshot, &eid("C"), 2, 0, &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"C","startTime":"09:00"}"#,
                r#"{"entryId":"A","startTime":"09:15"}"#,
                r#"{"entryId":"B","startTime":"09:30"}"#,
            ]
        );
    }

    #[test]
    fn reorder_projects_global_order_onto_track() {
        // Global view: A(t1 09:00) X(t2 09:05) B(t1 09:30) Y(t2 09:40)
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 30),
            entry("X", "t2", "09:05", 35),
            entry("B", "t1", "09:30", 10),
            entry("Y", "t2", "09:40", 10),
        ]);
        let batch = plan_reorder(&snapshot, &eid("B"), 2, 0, &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"B","startTime":"09:00"}"#,
                r#"{"entryId":"A","startTime":"09:10"}"#,
            ]
        );
    }

    #[test]
    fn reorder_same_index_is_noop() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 15), entry("B", "t1", "09:20", 15)]);
        let batch = plan_reorder(&snapshot, &eid("A"), 1, 1, &CascadeConfig::default()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn reorder_clamps_out_of_bounds_indices() {
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 15),
            entry("B", "t1", "09:15", 15),
        ]);
        let batch = plan_reorder(&snapshot, &eid("A"), 99, 42, &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"B","startTime":"09:00"}"#,
                r#"{"entryId":"A","startTime":"09:15"}"#,
            ]
        );

        let to_same_place =
            plan_reorder(&snapshot, &eid("B"), 1, 7, &CascadeConfig::default()).unwrap();
        assert!(to_same_place.is_empty());
    }

    #[test]
    fn reorder_keeps_track_anchor() {
        let snapshot = day(vec![
            entry("A", "t1", "06:30", 60),
            entry("B", "t1", "07:30", 30),
        ]);
        let batch = plan_reorder(&snapshot, &eid("B"), 1, 0, &CascadeConfig::default()).unwrap();
        let b = batch.updates.iter().find(|u| u.entry_id == eid("B")).unwrap();
        assert_eq!(b.start_time.as_deref(), Some("06:30"));
    }

    #[test]
    fn reorder_without_cascade_rewrites_order_only() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 15), entry("B", "t1", "09:15", 15)]);
        let config = CascadeConfig {
            enabled: false,
            ..CascadeConfig::default()
        };
        let batch = plan_reorder(&snapshot, &eid("B"), 1, 0, &config).unwrap();
        assert_eq!(
            summary(&batch),
            vec![r#"{"entryId":"B","order":0}"#, r#"{"entryId":"A","order":1}"#]
        );
    }

    #[test]
    fn reorder_of_multi_lane_banner_is_noop() {
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 15),
            entry("lunch", "shared", "12:00", 60),
        ]);
        let batch = plan_reorder(&snapshot, &eid("lunch"), 1, 0, &CascadeConfig::default()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn reorder_unknown_entry_fails() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 15)]);
        let err = plan_reorder(&snapshot, &eid("nope"), 0, 1, &CascadeConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "entry not found: nope");
    }

    #[test]
    fn move_into_empty_track_inherits_drop_time() {
        let snapshot = day(vec![
            entry("X", "t1", "10:00", 20),
            entry("Y", "t1", "10:20", 15),
        ]);
        let batch = plan_move(&snapshot, &eid("X"), &tid("t2"), &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"X","trackId":"t2"}"#,
                r#"{"entryId":"Y","startTime":"10:00"}"#,
            ]
        );
    }

    #[test]
    fn move_into_populated_track_packs_both_tracks() {
        let snapshot = day(vec![
            entry("A", "t1", "08:00", 30),
            entry("M", "t1", "08:30", 30),
            entry("C", "t1", "09:00", 30),
            entry("P", "t2", "08:00", 20),
            entry("Q", "t2", "08:20", 60),
        ]);
        let batch = plan_move(&snapshot, &eid("M"), &tid("t2"), &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"M","startTime":"09:20","trackId":"t2"}"#,
                r#"{"entryId":"C","startTime":"08:30"}"#,
            ]
        );

        let mut after = snapshot.clone();
        batch.apply_to(&mut after);
        assert!(is_gapless(&after.entries, &tid("t1")));
        assert!(is_gapless(&after.entries, &tid("t2")));
    }

    #[test]
    fn move_to_same_track_is_noop() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 15)]);
        let batch = plan_move(&snapshot, &eid("A"), &tid("t1"), &CascadeConfig::default()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn move_onto_shared_track_is_rejected() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 15)]);
        let err =
            plan_move(&snapshot, &eid("A"), &tid("shared"), &CascadeConfig::default()).unwrap_err();
        assert!(matches!(err, CascadeError::NotALane(_)));
    }

    #[test]
    fn move_single_lane_banner_rewrites_applicability() {
        let mut lunch = entry("lunch", "shared", "12:00", 60);
        lunch.applies_to_track_ids = vec![tid("t1")];
        let snapshot = day(vec![
            entry("A", "t1", "11:00", 60),
            lunch,
            entry("B", "t1", "13:00", 30),
            entry("P", "t2", "11:30", 30),
        ]);
        let batch =
            plan_move(&snapshot, &eid("lunch"), &tid("t2"), &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"lunch","appliesToTrackIds":["t2"]}"#,
                r#"{"entryId":"B","startTime":"12:00"}"#,
            ]
        );
    }

    #[test]
    fn move_without_cascade_only_reassigns() {
        let snapshot = day(vec![entry("X", "t1", "10:00", 20), entry("Y", "t1", "10:20", 15)]);
        let config = CascadeConfig {
            enabled: false,
            ..CascadeConfig::default()
        };
        let batch = plan_move(&snapshot, &eid("X"), &tid("t2"), &config).unwrap();
        assert_eq!(summary(&batch), vec![r#"{"entryId":"X","trackId":"t2"}"#]);
    }

    #[test]
    fn day_shift_moves_every_entry() {
        let snapshot = day(vec![
            entry("A", "t1", "08:00", 60),
            entry("B", "t2", "08:30", 30),
            entry("lunch", "shared", "12:00", 60),
        ]);
        let batch = plan_day_start_shift(&snapshot, "07:15", &CascadeConfig::default()).unwrap();
        assert_eq!(batch.day_start_time.as_deref(), Some("07:15"));
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"A","startTime":"07:15"}"#,
                r#"{"entryId":"B","startTime":"07:45"}"#,
                r#"{"entryId":"lunch","startTime":"11:15"}"#,
            ]
        );
    }

    #[test]
    fn day_shift_with_zero_delta_persists_setting_only() {
        let snapshot = day(vec![entry("A", "t1", "08:00", 60)]);
        let batch = plan_day_start_shift(&snapshot, "08:00", &CascadeConfig::default()).unwrap();
        assert!(batch.updates.is_empty());
        assert_eq!(batch.day_start_time.as_deref(), Some("08:00"));
    }

    #[test]
    fn day_shift_on_empty_day_persists_setting_only() {
        let snapshot = day(Vec::new());
        let batch = plan_day_start_shift(&snapshot, "6:05", &CascadeConfig::default()).unwrap();
        assert!(batch.updates.is_empty());
        assert_eq!(batch.day_start_time.as_deref(), Some("06:05"));
    }

    #[test]
    fn day_shift_past_midnight_is_rejected() {
        let snapshot = day(vec![
            entry("A", "t1", "08:00", 60),
            entry("wrap", "t2", "22:00", 90),
        ]);
        let err = plan_day_start_shift(&snapshot, "09:00", &CascadeConfig::default()).unwrap_err();
        match err {
            CascadeError::OutOfRange {
                earliest,
                latest,
                delta,
            } => {
                assert_eq!((earliest, latest, delta), (480, 1410, 60));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn day_shift_rejects_invalid_time() {
        let snapshot = day(vec![entry("A", "t1", "08:00", 60)]);
        let err = plan_day_start_shift(&snapshot, "25:99", &CascadeConfig::default()).unwrap_err();
        assert!(matches!(err, CascadeError::InvalidTime(_)));
    }

    #[test]
    fn normalize_repairs_every_lane() {
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 30),
            entry("B", "t1", "09:40", 20),
            entry("P", "t2", "10:00", 30),
            entry("Q", "t2", "10:20", 30),
            entry("lunch", "shared", "12:00", 60),
        ]);
        let batch = plan_normalize(&snapshot, &CascadeConfig::default());
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"B","startTime":"09:30"}"#,
                r#"{"entryId":"Q","startTime":"10:30"}"#,
            ]
        );

        let mut after = snapshot.clone();
        batch.apply_to(&mut after);
        assert!(plan_normalize(&after, &CascadeConfig::default()).is_empty());
    }

    #[test]
    fn reorder_past_other_tracks_only_is_empty() {
        // Global view: A(t1) X(t2) B(t1); B passes only X
        let snapshot = day(vec![
            entry("A", "t1", "09:00", 30),
            entry("X", "t2", "09:10", 20),
            entry("B", "t1", "09:30", 30),
        ]);
        let batch = plan_reorder(&snapshot, &eid("B"), 2, 1, &CascadeConfig::default()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn reorder_single_lane_banner_packs_into_its_lane() {
        let mut lunch = entry("lunch", "shared", "12:00", 60);
        lunch.applies_to_track_ids = vec![tid("t1")];
        let snapshot = day(vec![
            entry("A", "t1", "11:00", 60),
            lunch,
            entry("B", "t1", "13:00", 30),
        ]);
        let batch = plan_reorder(&snapshot, &eid("lunch"), 1, 0, &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![
                r#"{"entryId":"lunch","startTime":"11:00"}"#,
                r#"{"entryId":"A","startTime":"12:00"}"#,
            ]
        );
    }

    #[test]
    fn move_untimed_entry_into_empty_lane_uses_day_start() {
        let mut untimed = entry("X", "t1", "10:00", 20);
        untimed.start_time = None;
        let mut snapshot = day(vec![untimed, entry("Y", "t1", "10:00", 15)]);
        snapshot.day_start_time = Some("08:30".to_string());

        let batch = plan_move(&snapshot, &eid("X"), &tid("t2"), &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![r#"{"entryId":"X","startTime":"08:30","trackId":"t2"}"#]
        );

        snapshot.day_start_time = None;
        let batch = plan_move(&snapshot, &eid("X"), &tid("t2"), &CascadeConfig::default()).unwrap();
        assert_eq!(
            summary(&batch),
            vec![r#"{"entryId":"X","startTime":"07:00","trackId":"t2"}"#]
        );
    }

    #[test]
    fn move_that_overruns_the_day_is_rejected() {
        let snapshot = day(vec![
            entry("A", "t1", "23:00", 30),
            entry("Z", "t2", "22:00", 60),
        ]);
        let err = plan_move(&snapshot, &eid("Z"), &tid("t1"), &CascadeConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "track t1 would run until minute 1470, past the end of the day"
        );
    }

    #[test]
    fn normalize_leaves_overrunning_lane_alone() {
        let snapshot = day(vec![
            entry("A", "t1", "23:00", 60),
            entry("B", "t1", "23:30", 30),
            entry("P", "t2", "09:00", 30),
            entry("Q", "t2", "09:40", 30),
        ]);
        let batch = plan_normalize(&snapshot, &CascadeConfig::default());
        assert_eq!(
            summary(&batch),
            vec![r#"{"entryId":"Q","startTime":"09:30"}"#]
        );

        let mut after = snapshot.clone();
        batch.apply_to(&mut after);
        assert!(plan_normalize(&after, &CascadeConfig::default()).is_empty());
    }

    #[test]
    fn day_shift_to_current_start_is_unchanged() {
        let mut snapshot = day(vec![entry("A", "t1", "08:00", 60)]);
        snapshot.day_start_time = Some("08:00".to_string());
        let mut coordinator = CascadeCoordinator::new(RecordingPort::default());

        let outcome = coordinator
            .set_day_start_time(&snapshot, "8:00", &CascadeConfig::default())
            .unwrap();
        assert_eq!(outcome, CascadeOutcome::Unchanged);
        assert!(coordinator.into_port().batches.is_empty());
    }

    #[test]
    fn coordinator_submits_once_and_skips_empty_batches() {
        let snapshot = day(vec![entry("A", "t1", "09:00", 30), entry("B", "t1", "09:40", 20)]);
        let config = CascadeConfig::default();
        let mut coordinator = CascadeCoordinator::new(RecordingPort::default());

        let outcome = coordinator.normalize_day(&snapshot, &config).unwrap();
        assert!(matches!(outcome, CascadeOutcome::Submitted(_)));

        let outcome = coordinator
            .reorder_entries(&snapshot, &eid("A"), 0, 0, &config)
            .unwrap();
        assert_eq!(outcome, CascadeOutcome::Unchanged);

        assert_eq!(coordinator.port().batches.len(), 1);
    }

    #[test]
    fn coordinator_surfaces_rejections_without_writing() {
        let snapshot = day(vec![entry("A", "t1", "23:00", 50)]);
        let mut coordinator = CascadeCoordinator::new(RecordingPort::default());
        let result = coordinator.set_day_start_time(&snapshot, "23:30", &CascadeConfig::default());
        assert!(matches!(result, Err(CascadeError::OutOfRange { .. })));
        assert!(coordinator.into_port().batches.is_empty());
    }

    #[test]
    fn coordinator_wraps_port_errors() {
        let snapshot = day(vec![entry("X", "t1", "10:00", 20), entry("Y", "t1", "10:20", 15)]);
        let mut coordinator = CascadeCoordinator::new(RecordingPort {
            batches: Vec::new(),
            fail: true,
        });
        let err = coordinator
            .move_entry_to_track(&snapshot, &eid("X"), &tid("t2"), &CascadeConfig::default())
            .unwrap_err();
        assert!(matches!(err, CascadeError::Persistence(_)));
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("store offline".to_string())
        );
    }
}
