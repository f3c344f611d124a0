//! Days command listing stored schedules.

use std::io::Write;

use anyhow::Result;
use cs_db::{Database, DayRecord};

/// Runs the days command.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let days = db.list_days()?;
    write_days(writer, &days)
}

fn write_days<W: Write>(writer: &mut W, days: &[DayRecord]) -> Result<()> {
    if days.is_empty() {
        writeln!(writer, "No days imported.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'callsheet import <file>' to store a day.")?;
        return Ok(());
    }

    writeln!(writer, "{:<20}  {:<10}  {:<5}  {:>7}", "ID", "Date", "Start", "Entries")?;
    writeln!(
        writer,
        "────────────────────  ──────────  ─────  ───────"
    )?;
    for day in days {
        writeln!(
            writer,
            "{:<20}  {:<10}  {:<5}  {:>7}",
            day.id,
            day.date.as_deref().unwrap_or("-"),
            day.day_start_time.as_deref().unwrap_or("-"),
            day.entry_count
        )?;
    }
    Ok(())
}
