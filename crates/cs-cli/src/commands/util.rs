//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use cs_core::{
    BatchPersistence, CascadeConfig, CascadeCoordinator, CascadeError, CascadeOutcome, DayId,
    DaySchedule, EntryUpdate, ScheduleBatch, TrackId,
};
use cs_db::{Database, DayStore, DbError};

/// Where a command's batch goes.
pub enum Target<'a> {
    /// Write through to the stored day.
    Store(DayStore<'a>),
    /// Compute only.
    DryRun,
}

impl BatchPersistence for Target<'_> {
    type Error = DbError;

    fn apply_batch(&mut self, batch: &ScheduleBatch) -> Result<(), Self::Error> {
        match self {
            Self::Store(store) => store.apply_batch(batch),
            Self::DryRun => Ok(()),
        }
    }
}

/// Parses a day ID argument.
pub fn parse_day_id(day: &str) -> Result<DayId> {
    DayId::new(day).with_context(|| format!("invalid day id {day:?}"))
}

/// Loads a day snapshot and runs one cascade action against it.
///
/// The action sees the snapshot, a coordinator writing to the day (or to
/// nothing on a dry run), and the cascade settings.
pub fn run_action<W, F>(
    writer: &mut W,
    db: &mut Database,
    day: &str,
    cascade: &CascadeConfig,
    dry_run: bool,
    action: F,
) -> Result<()>
where
    W: Write,
    F: FnOnce(
        &DaySchedule,
        &mut CascadeCoordinator<Target<'_>>,
        &CascadeConfig,
    ) -> Result<CascadeOutcome, CascadeError>,
{
    let day_id = parse_day_id(day)?;
    let snapshot = db
        .load_day(&day_id)
        .with_context(|| format!("failed to load day {day_id}"))?;
    let target = if dry_run {
        Target::DryRun
    } else {
        Target::Store(DayStore::new(db, day_id))
    };
    let mut coordinator = CascadeCoordinator::new(target);
    let outcome = action(&snapshot, &mut coordinator, cascade)?;
    write_outcome(writer, &outcome, dry_run)
}

/// Writes a human-readable summary of an action's outcome.
pub fn write_outcome<W: Write>(
    writer: &mut W,
    outcome: &CascadeOutcome,
    dry_run: bool,
) -> Result<()> {
    match outcome {
        CascadeOutcome::Unchanged => writeln!(writer, "No changes.")?,
        CascadeOutcome::Submitted(batch) => {
            let verb = if dry_run { "Would apply" } else { "Applied" };
            writeln!(writer, "{verb} {}:", describe_count(batch))?;
            if let Some(start) = &batch.day_start_time {
                writeln!(writer, "  day start -> {start}")?;
            }
            for update in &batch.updates {
                writeln!(writer, "  {}", describe_update(update))?;
            }
        }
    }
    Ok(())
}

fn describe_count(batch: &ScheduleBatch) -> String {
    match batch.updates.len() {
        1 => "1 update".to_string(),
        n => format!("{n} updates"),
    }
}

/// One-line description of an entry update, e.g. `B: start 09:30, track t2`.
pub fn describe_update(update: &EntryUpdate) -> String {
    let mut fields = Vec::new();
    if let Some(start) = &update.start_time {
        fields.push(format!("start {start}"));
    }
    if let Some(track) = &update.track_id {
        fields.push(format!("track {track}"));
    }
    if let Some(order) = update.order {
        fields.push(format!("order {order}"));
    }
    if let Some(tracks) = &update.applies_to_track_ids {
        let tracks: Vec<&str> = tracks.iter().map(TrackId::as_str).collect();
        fields.push(format!("applies to {}", tracks.join(", ")));
    }
    format!("{}: {}", update.entry_id, fields.join(", "))
}

/// Database holding `day-1`: lane t1 with A, B, C packed from 09:00 and
/// lane t2 with D at 09:00.
#[cfg(test)]
pub fn seeded_db() -> Database {
    let day: DaySchedule = serde_json::from_str(
        r#"{
            "id": "day-1",
            "dayStartTime": "09:00",
            "tracks": [
                {"id": "t1", "name": "Photo"},
                {"id": "t2", "name": "Video"}
            ],
            "entries": [
                {"id": "A", "trackId": "t1", "startTime": "09:00", "duration": 30},
                {"id": "B", "trackId": "t1", "startTime": "09:30", "duration": 20},
                {"id": "C", "trackId": "t1", "startTime": "09:50", "duration": 10},
                {"id": "D", "trackId": "t2", "startTime": "09:00", "duration": 45}
            ]
        }"#,
    )
    .unwrap();
    let mut db = Database::open_in_memory().unwrap();
    db.import_day(&day).unwrap();
    db
}
