//! Move command reassigning an entry to another lane.

use std::io::Write;

use anyhow::{Context, Result};
use cs_core::{CascadeConfig, EntryId, TrackId};
use cs_db::Database;

use super::util::run_action;

/// Runs the move command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: &str,
    entry: &str,
    track: &str,
    cascade: &CascadeConfig,
    dry_run: bool,
) -> Result<()> {
    let entry_id = EntryId::new(entry).with_context(|| format!("invalid entry id {entry:?}"))?;
    let track_id = TrackId::new(track).with_context(|| format!("invalid track id {track:?}"))?;
    run_action(writer, db, day, cascade, dry_run, |snapshot, coordinator, cascade| {
        coordinator.move_entry_to_track(snapshot, &entry_id, &track_id, cascade)
    })
}
