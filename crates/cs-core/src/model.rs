//! Schedule entries, tracks and day snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::time::{MINUTES_PER_DAY, parse_time_to_minutes};
use crate::types::{DayId, EntryId, TrackId, TrackScope};

/// Duration assumed for entries stored without a usable duration.
pub const DEFAULT_DURATION_MINUTES: i32 = 15;

/// A scheduled block on a shoot day.
///
/// Only `track_id`, `start_time`, `order` and `applies_to_track_ids` are
/// ever rewritten by the cascade engine. Everything else the document
/// carries (title, category, color, ...) is kept in `payload` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Stable identifier.
    pub id: EntryId,

    /// Lane the entry lives on, or a shared marker for banners.
    pub track_id: TrackId,

    /// Explicit `HH:MM` start; absent means "derive from position".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Length in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Tie-break for equal or absent start times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    /// Lanes a banner applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to_track_ids: Vec<TrackId>,

    /// Opaque fields the engine never reads.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Entry {
    /// Creates an entry with no payload, order or applicability list.
    pub fn new(id: EntryId, track_id: TrackId, start_time: Option<&str>, duration: i64) -> Self {
        Self {
            id,
            track_id,
            start_time: start_time.map(String::from),
            duration: Some(duration),
            order: None,
            applies_to_track_ids: Vec::new(),
            payload: Map::new(),
        }
    }

    /// Minutes since midnight of the stored start time, if it parses.
    pub fn start_minutes(&self) -> Option<i32> {
        self.start_time.as_deref().and_then(parse_time_to_minutes)
    }

    /// Duration in minutes, falling back to [`DEFAULT_DURATION_MINUTES`]
    /// when missing, non-positive, or longer than a whole day.
    pub fn duration_minutes(&self) -> i32 {
        self.duration
            .and_then(|d| i32::try_from(d).ok())
            .filter(|d| (1..=MINUTES_PER_DAY).contains(d))
            .unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    /// Minute the entry ends at, if it has a start.
    pub fn end_minutes(&self) -> Option<i32> {
        self.start_minutes().map(|start| start + self.duration_minutes())
    }

    /// Returns true if this is a banner on a shared marker track whose
    /// applicability list names exactly one other track.
    pub fn is_single_lane_banner(&self) -> bool {
        self.track_id.is_shared_marker()
            && self.applies_to_track_ids.len() == 1
            && self.applies_to_track_ids[0] != self.track_id
    }

    /// The track whose packed sequence this entry takes part in.
    ///
    /// A banner whose applicability list names exactly one lane is laid
    /// out as a member of that lane.
    pub fn layout_track_id(&self) -> &TrackId {
        if self.is_single_lane_banner() {
            &self.applies_to_track_ids[0]
        } else {
            &self.track_id
        }
    }
}

/// A column of the day timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stable identifier.
    pub id: TrackId,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Lane or shared banner row.
    #[serde(default)]
    pub scope: TrackScope,
}

impl Track {
    /// Creates a lane track.
    pub fn lane(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scope: TrackScope::Lane,
        }
    }

    /// Creates a shared banner track.
    pub fn shared(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scope: TrackScope::Shared,
        }
    }
}

/// One shoot day: its tracks, entries and configured start time.
///
/// This is both the JSON document the CLI imports and the immutable
/// snapshot every cascade operation computes against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// Day identifier.
    pub id: DayId,

    /// Calendar date of the shoot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Configured day start (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_start_time: Option<String>,

    /// Tracks in display order.
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// All entries of the day, across tracks.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl DaySchedule {
    /// Creates an empty day.
    pub fn new(id: DayId) -> Self {
        Self {
            id,
            date: None,
            day_start_time: None,
            tracks: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Looks up a track by id.
    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// Looks up an entry by id.
    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Returns true if `id` addresses a lane that takes part in packing.
    ///
    /// Unknown ids count as lanes unless they are a shared marker, so
    /// entries referencing a track missing from the snapshot still pack.
    pub fn is_lane(&self, id: &TrackId) -> bool {
        if id.is_shared_marker() {
            return false;
        }
        self.track(id).is_none_or(|t| t.scope == TrackScope::Lane)
    }

    /// Lane ids in display order, followed by lanes only referenced by entries.
    pub fn lane_ids(&self) -> Vec<TrackId> {
        let mut lanes: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|t| t.scope == TrackScope::Lane && !t.id.is_shared_marker())
            .map(|t| t.id.clone())
            .collect();
        for entry in &self.entries {
            let track_id = entry.layout_track_id();
            if self.is_lane(track_id) && !lanes.contains(track_id) {
                lanes.push(track_id.clone());
            }
        }
        lanes
    }

    /// Entries laid out on the given track, in snapshot order.
    pub fn entries_on(&self, track_id: &TrackId) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.layout_track_id() == track_id)
            .collect()
    }

    /// Configured day start in minutes, if set and valid.
    pub fn day_start_minutes(&self) -> Option<i32> {
        self.day_start_time.as_deref().and_then(parse_time_to_minutes)
    }
}
