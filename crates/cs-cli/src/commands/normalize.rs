//! Normalize command repacking every lane of a stored day.

use std::io::Write;

use anyhow::Result;
use cs_core::CascadeConfig;
use cs_db::Database;

use super::util::run_action;

/// Runs the normalize command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: &str,
    cascade: &CascadeConfig,
    dry_run: bool,
) -> Result<()> {
    run_action(writer, db, day, cascade, dry_run, |snapshot, coordinator, cascade| {
        coordinator.normalize_day(snapshot, cascade)
    })
}
