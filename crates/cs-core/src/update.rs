//! Field-level diffs and the batches handed to persistence.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{DaySchedule, Entry};
use crate::types::{EntryId, TrackId};

/// Changed fields for a single entry.
///
/// `None` means "leave as stored"; only fields that actually change are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    pub entry_id: EntryId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to_track_ids: Option<Vec<TrackId>>,
}

impl EntryUpdate {
    /// Creates an update that changes nothing yet.
    pub const fn new(entry_id: EntryId) -> Self {
        Self {
            entry_id,
            start_time: None,
            track_id: None,
            order: None,
            applies_to_track_ids: None,
        }
    }

    /// Sets the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    /// Sets the track.
    #[must_use]
    pub fn with_track_id(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Sets the order.
    #[must_use]
    pub const fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the banner applicability list.
    #[must_use]
    pub fn with_applies_to(mut self, track_ids: Vec<TrackId>) -> Self {
        self.applies_to_track_ids = Some(track_ids);
        self
    }

    /// Returns true if no field is changed.
    pub const fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.track_id.is_none()
            && self.order.is_none()
            && self.applies_to_track_ids.is_none()
    }

    /// Overlays the fields set in `later` onto this update.
    pub fn merge(&mut self, later: Self) {
        if later.start_time.is_some() {
            self.start_time = later.start_time;
        }
        if later.track_id.is_some() {
            self.track_id = later.track_id;
        }
        if later.order.is_some() {
            self.order = later.order;
        }
        if later.applies_to_track_ids.is_some() {
            self.applies_to_track_ids = later.applies_to_track_ids;
        }
    }

    /// Writes the changed fields into an entry.
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(start_time) = &self.start_time {
            entry.start_time = Some(start_time.clone());
        }
        if let Some(track_id) = &self.track_id {
            entry.track_id = track_id.clone();
        }
        if let Some(order) = self.order {
            entry.order = Some(order);
        }
        if let Some(applies_to) = &self.applies_to_track_ids {
            entry.applies_to_track_ids.clone_from(applies_to);
        }
    }
}

/// Updates merged by entry id, in first-seen order.
///
/// Merging an update for an id already present overwrites only the fields
/// the new update sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSet {
    updates: IndexMap<EntryId, EntryUpdate>,
}

impl UpdateSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one update into the set.
    pub fn merge(&mut self, update: EntryUpdate) {
        if update.is_empty() {
            return;
        }
        match self.updates.get_mut(&update.entry_id) {
            Some(existing) => existing.merge(update),
            None => {
                self.updates.insert(update.entry_id.clone(), update);
            }
        }
    }

    /// Returns the merged update for an entry.
    pub fn get(&self, entry_id: &EntryId) -> Option<&EntryUpdate> {
        self.updates.get(entry_id)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Consumes the set, returning updates in first-seen order.
    pub fn into_vec(self) -> Vec<EntryUpdate> {
        self.updates.into_values().collect()
    }
}

impl Extend<EntryUpdate> for UpdateSet {
    fn extend<T: IntoIterator<Item = EntryUpdate>>(&mut self, iter: T) {
        for update in iter {
            self.merge(update);
        }
    }
}

impl FromIterator<EntryUpdate> for UpdateSet {
    fn from_iter<T: IntoIterator<Item = EntryUpdate>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Everything one user action persists, handed over in a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBatch {
    /// Per-entry field changes.
    #[serde(default)]
    pub updates: Vec<EntryUpdate>,

    /// New day start setting, when the action changes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_start_time: Option<String>,
}

impl ScheduleBatch {
    /// Creates a batch of entry updates only.
    pub fn from_updates(updates: UpdateSet) -> Self {
        Self {
            updates: updates.into_vec(),
            day_start_time: None,
        }
    }

    /// Returns true if persisting this batch would write nothing.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.day_start_time.is_none()
    }

    /// Applies the batch to an in-memory day.
    ///
    /// Updates addressing unknown entries are skipped.
    pub fn apply_to(&self, day: &mut DaySchedule) {
        for update in &self.updates {
            if let Some(entry) = day.entries.iter_mut().find(|e| e.id == update.entry_id) {
                update.apply_to(entry);
            }
        }
        if let Some(start) = &self.day_start_time {
            day.day_start_time = Some(start.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::new(s).unwrap()
    }

    #[test]
    fn later_fields_overwrite_earlier_ones() {
        let mut set = UpdateSet::new();
        set.merge(EntryUpdate::new(id("x")).with_track_id(TrackId::new("t2").unwrap()));
        set.merge(EntryUpdate::new(id("y")).with_start_time("10:00"));
        set.merge(EntryUpdate::new(id("x")).with_start_time("09:00"));
        set.merge(EntryUpdate::new(id("x")).with_start_time("09:30"));

        assert_eq!(set.len(), 2);
        let x = set.get(&id("x")).unwrap();
        assert_eq!(x.track_id.as_ref().unwrap().as_str(), "t2");
        assert_eq!(x.start_time.as_deref(), Some("09:30"));

        let order: Vec<String> = set.into_vec().into_iter().map(|u| u.entry_id.into()).collect();
        assert_eq!(order, vec!["x", "y"]);
    }

    #[test]
    fn empty_updates_are_dropped() {
        let set: UpdateSet = vec![EntryUpdate::new(id("x"))].into_iter().collect();
        assert!(set.is_empty());
    }

    #[test]
    fn batch_serializes_only_changed_fields() {
        let batch = ScheduleBatch {
            updates: vec![
                EntryUpdate::new(id("x")).with_track_id(TrackId::new("lane-2").unwrap()),
                EntryUpdate::new(id("y")).with_start_time("10:00"),
            ],
            day_start_time: None,
        };
        let json = serde_json::to_string(&batch).unwrap();
        insta::assert_snapshot!(json, @r#"{"updates":[{"entryId":"x","trackId":"lane-2"},{"entryId":"y","startTime":"10:00"}]}"#);
    }

    #[test]
    fn batch_applies_to_day() {
        let mut day = DaySchedule::new(crate::types::DayId::new("d").unwrap());
        day.entries.push(Entry::new(
            id("x"),
            TrackId::new("lane-1").unwrap(),
            Some("08:00"),
            30,
        ));
        let batch = ScheduleBatch {
            updates: vec![
                EntryUpdate::new(id("x"))
                    .with_start_time("08:30")
                    .with_order(3),
                EntryUpdate::new(id("ghost")).with_start_time("01:00"),
            ],
            day_start_time: Some("08:30".to_string()),
        };
        batch.apply_to(&mut day);

        assert_eq!(day.entries[0].start_time.as_deref(), Some("08:30"));
        assert_eq!(day.entries[0].order, Some(3));
        assert_eq!(day.day_start_time.as_deref(), Some("08:30"));
    }

    #[test]
    fn default_batch_is_empty() {
        assert!(ScheduleBatch::default().is_empty());
        let setting_only = ScheduleBatch {
            updates: Vec::new(),
            day_start_time: Some("07:00".to_string()),
        };
        assert!(!setting_only.is_empty());
    }
}
