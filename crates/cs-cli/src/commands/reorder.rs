//! Reorder command dragging an entry within the time-sorted day view.

use std::io::Write;

use anyhow::{Context, Result};
use cs_core::{CascadeConfig, EntryId};
use cs_db::Database;

use super::util::run_action;

/// Runs the reorder command.
#[expect(clippy::too_many_arguments, reason = "CLI argument passthrough")]
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: &str,
    entry: &str,
    from: usize,
    to: usize,
    cascade: &CascadeConfig,
    dry_run: bool,
) -> Result<()> {
    let entry_id = EntryId::new(entry).with_context(|| format!("invalid entry id {entry:?}"))?;
    run_action(writer, db, day, cascade, dry_run, |snapshot, coordinator, cascade| {
        coordinator.reorder_entries(snapshot, &entry_id, from, to, cascade)
    })
}
