//! Set-start command shifting a day to a new start time.
//!
//! Accepts the same input a user would type into a time field: 24-hour
//! `H:MM`/`HH:MM`, or 12-hour with an `am`/`pm` suffix. Unparsable input
//! leaves the stored start untouched.

use std::io::Write;

use anyhow::{Result, bail};
use cs_core::{CascadeConfig, parse_typed_time_input};
use cs_db::Database;

use super::util::run_action;

/// Runs the set-start command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    day: &str,
    time: &str,
    cascade: &CascadeConfig,
    dry_run: bool,
) -> Result<()> {
    let Some(typed) = parse_typed_time_input(time) else {
        bail!("invalid time {time:?}, expected HH:MM or H:MM am/pm; day start left unchanged");
    };
    run_action(writer, db, day, cascade, dry_run, |snapshot, coordinator, cascade| {
        coordinator.set_day_start_time(snapshot, &typed.canonical, cascade)
    })
}
