//! Show command rendering a day as a per-track timeline.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use cs_core::{DaySchedule, Entry, is_gapless, minutes_to_time_string, sort_entries_by_time};
use cs_db::Database;

use super::util::parse_day_id;

/// Runs the show command.
pub fn run<W: Write>(writer: &mut W, db: &Database, day: &str, json: bool) -> Result<()> {
    let day_id = parse_day_id(day)?;
    let day = db
        .load_day(&day_id)
        .with_context(|| format!("failed to load day {day_id}"))?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&day)?)?;
    } else {
        write!(writer, "{}", format_timeline(&day))?;
    }
    Ok(())
}

/// Formats every lane of the day followed by its banners.
pub fn format_timeline(day: &DaySchedule) -> String {
    let mut output = String::new();

    let date = day
        .date
        .map_or_else(|| "undated".to_string(), |d| d.format("%Y-%m-%d").to_string());
    let start = day.day_start_time.as_deref().unwrap_or("unset");
    writeln!(output, "DAY {} ({date}), start {start}", day.id).unwrap();

    for lane in day.lane_ids() {
        writeln!(output).unwrap();
        let name = day.track(&lane).map_or("", |t| t.name.as_str());
        let status = if is_gapless(&day.entries, &lane) {
            ""
        } else {
            "  [gaps]"
        };
        if name.is_empty() {
            writeln!(output, "{lane}{status}").unwrap();
        } else {
            writeln!(output, "{name} ({lane}){status}").unwrap();
        }
        let entries = day.entries_on(&lane);
        if entries.is_empty() {
            writeln!(output, "  (empty)").unwrap();
        }
        for entry in sort_entries_by_time(entries) {
            writeln!(output, "  {}", format_entry(entry)).unwrap();
        }
    }

    let banners: Vec<&Entry> = day
        .entries
        .iter()
        .filter(|e| !day.is_lane(e.layout_track_id()))
        .collect();
    if !banners.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "Banners").unwrap();
        for entry in sort_entries_by_time(banners) {
            writeln!(output, "  {}", format_entry(entry)).unwrap();
        }
    }

    output
}

fn format_entry(entry: &Entry) -> String {
    let span = match (entry.start_minutes(), entry.end_minutes()) {
        (Some(start), Some(end)) => format!(
            "{}-{}",
            minutes_to_time_string(start),
            minutes_to_time_string(end)
        ),
        _ => "--:-- -----".to_string(),
    };
    let title = entry
        .payload
        .get("title")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");
    let mut line = format!("{span}  {:<12}", entry.id.as_str());
    if entry.is_single_lane_banner() {
        line.push_str("  (banner)");
    }
    if !title.is_empty() {
        line.push_str("  ");
        line.push_str(title);
    }
    line.trim_end().to_string()
}
