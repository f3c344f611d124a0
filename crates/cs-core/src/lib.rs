//! Core scheduling logic for call sheets.
//!
//! This crate contains the fundamental types and logic for:
//! - Time codec: minute-of-day arithmetic and typed time parsing
//! - Sequencing: ordering entries and resolving track anchors
//! - Layout: keeping each lane gapless and diffing against stored values
//! - Cascade: reorder, cross-track move, day start shift and load-time repair

pub mod cascade;
pub mod layout;
pub mod model;
pub mod sequence;
pub mod time;
pub mod types;
pub mod update;

pub use cascade::{
    BatchPersistence, CascadeConfig, CascadeCoordinator, CascadeError, CascadeOutcome,
    plan_day_start_shift, plan_move, plan_normalize, plan_reorder,
};
pub use layout::{
    PastMidnight, build_gapless_normalize_start_time_updates, build_gapless_reorder_updates,
    build_order_updates, is_gapless,
};
pub use model::{DEFAULT_DURATION_MINUTES, DaySchedule, Entry, Track};
pub use sequence::{get_track_anchor_start_minutes, sort_entries_by_time};
pub use time::{
    MINUTES_PER_DAY, TypedTime, minutes_to_time_string, parse_time_to_minutes,
    parse_typed_time_input,
};
pub use types::{DayId, EntryId, TrackId, TrackScope, ValidationError};
pub use update::{EntryUpdate, ScheduleBatch, UpdateSet};
