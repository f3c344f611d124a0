//! History command listing the batches applied to a day.

use std::io::Write;

use anyhow::{Context, Result};
use cs_db::{BatchRecord, Database};

use super::util::{describe_update, parse_day_id};

/// Runs the history command.
pub fn run<W: Write>(writer: &mut W, db: &Database, day: &str) -> Result<()> {
    let day_id = parse_day_id(day)?;
    db.load_day(&day_id)
        .with_context(|| format!("failed to load day {day_id}"))?;
    let batches = db.list_batches(&day_id)?;
    write_history(writer, &batches)
}

fn write_history<W: Write>(writer: &mut W, batches: &[BatchRecord]) -> Result<()> {
    if batches.is_empty() {
        writeln!(writer, "No batches applied.")?;
        return Ok(());
    }
    for record in batches {
        let id_short: String = record.id.chars().take(8).collect();
        writeln!(
            writer,
            "{}  {id_short}",
            record.applied_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        if let Some(start) = &record.batch.day_start_time {
            writeln!(writer, "  day start -> {start}")?;
        }
        for update in &record.batch.updates {
            writeln!(writer, "  {}", describe_update(update))?;
        }
    }
    Ok(())
}
