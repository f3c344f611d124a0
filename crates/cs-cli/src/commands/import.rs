//! Import command for storing a day schedule document.
//!
//! The document is a `DaySchedule` in its JSON form. Every import is
//! followed by load normalization so drifted lanes are repacked at once.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use cs_core::{CascadeConfig, CascadeOutcome, DaySchedule, plan_normalize};
use cs_db::Database;

use super::util::{run_action, write_outcome};

/// Reads, stores and normalizes a day. On a dry run nothing is stored.
pub fn run<W: Write, R: Read>(
    writer: &mut W,
    reader: R,
    db: &mut Database,
    cascade: &CascadeConfig,
    dry_run: bool,
) -> Result<()> {
    let day = parse_day(reader)?;
    writeln!(
        writer,
        "Imported day {}: {} tracks, {} entries",
        day.id,
        day.tracks.len(),
        day.entries.len()
    )?;

    if dry_run {
        let batch = plan_normalize(&day, cascade);
        let outcome = if batch.is_empty() {
            CascadeOutcome::Unchanged
        } else {
            CascadeOutcome::Submitted(batch)
        };
        return write_outcome(writer, &outcome, true);
    }

    db.import_day(&day)
        .with_context(|| format!("failed to store day {}", day.id))?;
    tracing::info!(day = %day.id, "imported day");
    run_action(
        writer,
        db,
        day.id.as_str(),
        cascade,
        false,
        |snapshot, coordinator, cascade| coordinator.normalize_day(snapshot, cascade),
    )
}

fn parse_day<R: Read>(mut reader: R) -> Result<DaySchedule> {
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .context("failed to read day document")?;
    serde_json::from_str(&raw).context("invalid day document")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::DayId;
    use insta::assert_snapshot;

    const DRIFTED: &str = r#"{
        "id": "shoot-1",
        "dayStartTime": "09:00",
        "tracks": [{"id": "t1", "name": "Photo"}],
        "entries": [
            {"id": "A", "trackId": "t1", "startTime": "09:00", "duration": 30},
            {"id": "B", "trackId": "t1", "startTime": "09:45", "duration": 15}
        ]
    }"#;

    fn import(db: &mut Database, doc: &str, dry_run: bool) -> String {
        let mut output = Vec::new();
        run(
            &mut output,
            doc.as_bytes(),
            db,
            &CascadeConfig::default(),
            dry_run,
        )
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn import_normalizes_drifted_lane() {
        let mut db = Database::open_in_memory().unwrap();
        let output = import(&mut db, DRIFTED, false);

        assert_snapshot!(output, @r"
        Imported day shoot-1: 1 tracks, 2 entries
        Applied 1 update:
          B: start 09:30
        ");
        let day = db.load_day(&DayId::new("shoot-1").unwrap()).unwrap();
        assert_eq!(day.entries[1].start_time.as_deref(), Some("09:30"));
        assert_eq!(db.list_batches(&day.id).unwrap().len(), 1);
    }

    #[test]
    fn import_dry_run_stores_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let output = import(&mut db, DRIFTED, true);

        assert_snapshot!(output, @r"
        Imported day shoot-1: 1 tracks, 2 entries
        Would apply 1 update:
          B: start 09:30
        ");
        assert!(db.list_days().unwrap().is_empty());
    }

    #[test]
    fn import_rejects_invalid_document() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = run(
            &mut output,
            r#"{"id": ""}"#.as_bytes(),
            &mut db,
            &CascadeConfig::default(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid day document");
    }
}
