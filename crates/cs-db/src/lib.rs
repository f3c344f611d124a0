//! Storage layer for call sheet schedules.
//!
//! Persists shoot days, their tracks and entries using `rusqlite`, and
//! implements the cascade engine's [`BatchPersistence`] port so each user
//! action lands as one transaction.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! Start times are stored as canonical `HH:MM` TEXT, exactly as the engine
//! emits them. Opaque entry fields live in the `payload` column as a JSON
//! object and banner applicability lists in `applies_to` as a JSON array.
//! Every applied batch is journaled in `batches` with its JSON body.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use cs_core::{
    BatchPersistence, DayId, DaySchedule, Entry, EntryId, ScheduleBatch, Track, TrackId,
    TrackScope,
};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The requested day has not been imported.
    #[error("day not found: {0}")]
    DayNotFound(DayId),
    /// A batch addressed an entry that is not stored for the day.
    #[error("entry {entry_id} not found on day {day_id}")]
    UnknownEntry { day_id: DayId, entry_id: EntryId },
    /// Failed to parse a stored day date.
    #[error("invalid date for day {day_id}: {date}")]
    DateParse {
        day_id: String,
        date: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to parse a stored journal timestamp.
    #[error("invalid timestamp for batch {batch_id}: {timestamp}")]
    TimestampParse {
        batch_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row could not be turned back into a schedule value.
    #[error("invalid stored data for {id}: {message}")]
    InvalidData { id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Summary of a stored day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub id: String,
    pub date: Option<String>,
    pub day_start_time: Option<String>,
    pub entry_count: i64,
}

/// A journaled batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub id: String,
    pub day_id: String,
    pub applied_at: DateTime<Utc>,
    pub batch: ScheduleBatch,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS days (
                id TEXT PRIMARY KEY,
                date TEXT,
                day_start_time TEXT
            );

            CREATE TABLE IF NOT EXISTS tracks (
                day_id TEXT NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                scope TEXT NOT NULL DEFAULT 'lane',
                position INTEGER NOT NULL,
                PRIMARY KEY (day_id, id),
                FOREIGN KEY (day_id) REFERENCES days(id) ON DELETE CASCADE
            );

            -- start_time: canonical 'HH:MM' or NULL (derived from position)
            -- applies_to: JSON array of track ids (banners only)
            -- payload: JSON object of fields the engine never reads
            CREATE TABLE IF NOT EXISTS entries (
                day_id TEXT NOT NULL,
                id TEXT NOT NULL,
                track_id TEXT NOT NULL,
                start_time TEXT,
                duration INTEGER,
                sort_order INTEGER,
                applies_to TEXT NOT NULL DEFAULT '[]',
                payload TEXT NOT NULL DEFAULT '{}',
                position INTEGER NOT NULL,
                PRIMARY KEY (day_id, id),
                FOREIGN KEY (day_id) REFERENCES days(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_entries_track ON entries(day_id, track_id);

            -- applied_at: ISO 8601 (e.g., '2026-03-02T07:15:00.000Z')
            -- body: the batch as JSON
            CREATE TABLE IF NOT EXISTS batches (
                id TEXT PRIMARY KEY,
                day_id TEXT NOT NULL,
                applied_at TEXT NOT NULL,
                update_count INTEGER NOT NULL,
                body TEXT NOT NULL,
                FOREIGN KEY (day_id) REFERENCES days(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_batches_day ON batches(day_id, applied_at);
            ",
        )?;
        Ok(())
    }

    /// Stores a day, replacing any previous version of it.
    ///
    /// Replacing a day also drops its batch journal.
    pub fn import_day(&mut self, day: &DaySchedule) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM days WHERE id = ?", params![day.id.as_str()])?;
        tx.execute(
            "INSERT INTO days (id, date, day_start_time) VALUES (?, ?, ?)",
            params![
                day.id.as_str(),
                day.date.map(|d| d.format("%Y-%m-%d").to_string()),
                day.day_start_time,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tracks (day_id, id, name, scope, position) VALUES (?, ?, ?, ?, ?)",
            )?;
            for (position, track) in (0_i64..).zip(&day.tracks) {
                stmt.execute(params![
                    day.id.as_str(),
                    track.id.as_str(),
                    track.name,
                    track.scope.as_str(),
                    position,
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO entries
                (day_id, id, track_id, start_time, duration, sort_order, applies_to, payload, position)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (position, entry) in (0_i64..).zip(&day.entries) {
                stmt.execute(params![
                    day.id.as_str(),
                    entry.id.as_str(),
                    entry.track_id.as_str(),
                    entry.start_time,
                    entry.duration,
                    entry.order,
                    encode_track_ids(&entry.applies_to_track_ids),
                    serde_json::Value::Object(entry.payload.clone()).to_string(),
                    position,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(
            day = %day.id,
            tracks = day.tracks.len(),
            entries = day.entries.len(),
            "imported day"
        );
        Ok(())
    }

    /// Lists stored days ordered by date then ID.
    pub fn list_days(&self) -> Result<Vec<DayRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT d.id, d.date, d.day_start_time,
                   (SELECT COUNT(*) FROM entries e WHERE e.day_id = d.id)
            FROM days d
            ORDER BY d.date ASC, d.id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DayRecord {
                id: row.get(0)?,
                date: row.get(1)?,
                day_start_time: row.get(2)?,
                entry_count: row.get(3)?,
            })
        })?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Loads an immutable snapshot of a day.
    pub fn load_day(&self, day_id: &DayId) -> Result<DaySchedule, DbError> {
        let header: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT date, day_start_time FROM days WHERE id = ?",
                params![day_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((date, day_start_time)) = header else {
            return Err(DbError::DayNotFound(day_id.clone()));
        };

        let mut day = DaySchedule::new(day_id.clone());
        day.date = date.map(|d| parse_date(&d, day_id.as_str())).transpose()?;
        day.day_start_time = day_start_time;
        day.tracks = self.load_tracks(day_id)?;
        day.entries = self.load_entries(day_id)?;
        Ok(day)
    }

    fn load_tracks(&self, day_id: &DayId) -> Result<Vec<Track>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, scope FROM tracks WHERE day_id = ? ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![day_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut tracks = Vec::new();
        for row in rows {
            let (id, name, scope) = row?;
            let scope: TrackScope = scope.parse().map_err(|e| invalid(&id, e))?;
            let id = TrackId::new(id.clone()).map_err(|e| invalid(&id, e))?;
            tracks.push(Track { id, name, scope });
        }
        Ok(tracks)
    }

    fn load_entries(&self, day_id: &DayId) -> Result<Vec<Entry>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, track_id, start_time, duration, sort_order, applies_to, payload
            FROM entries
            WHERE day_id = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map(params![day_id.as_str()], |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                track_id: row.get(1)?,
                start_time: row.get(2)?,
                duration: row.get(3)?,
                order: row.get(4)?,
                applies_to: row.get(5)?,
                payload: row.get(6)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    /// Applies a batch to a stored day in one transaction and journals it.
    ///
    /// If any update addresses an unknown entry nothing is written.
    pub fn apply_batch(
        &mut self,
        day_id: &DayId,
        batch: &ScheduleBatch,
    ) -> Result<BatchRecord, DbError> {
        // Journal timestamps keep millisecond precision
        let applied_at = Utc::now().trunc_subsecs(3);
        let record = BatchRecord {
            id: Uuid::new_v4().to_string(),
            day_id: day_id.to_string(),
            applied_at,
            batch: batch.clone(),
        };
        let body = serde_json::to_string(batch).map_err(|e| invalid(&record.id, e))?;

        let tx = self.conn.transaction()?;
        let day_exists = tx
            .query_row(
                "SELECT 1 FROM days WHERE id = ?",
                params![day_id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !day_exists {
            return Err(DbError::DayNotFound(day_id.clone()));
        }
        {
            let mut stmt = tx.prepare(
                "
                UPDATE entries SET
                    start_time = COALESCE(?1, start_time),
                    track_id = COALESCE(?2, track_id),
                    sort_order = COALESCE(?3, sort_order),
                    applies_to = COALESCE(?4, applies_to)
                WHERE day_id = ?5 AND id = ?6
                ",
            )?;
            for update in &batch.updates {
                let changed = stmt.execute(params![
                    update.start_time,
                    update.track_id.as_ref().map(TrackId::as_str),
                    update.order,
                    update.applies_to_track_ids.as_deref().map(encode_track_ids),
                    day_id.as_str(),
                    update.entry_id.as_str(),
                ])?;
                if changed == 0 {
                    return Err(DbError::UnknownEntry {
                        day_id: day_id.clone(),
                        entry_id: update.entry_id.clone(),
                    });
                }
            }
        }
        if let Some(start) = &batch.day_start_time {
            tx.execute(
                "UPDATE days SET day_start_time = ? WHERE id = ?",
                params![start, day_id.as_str()],
            )?;
        }
        tx.execute(
            "INSERT INTO batches (id, day_id, applied_at, update_count, body) VALUES (?, ?, ?, ?, ?)",
            params![
                record.id,
                record.day_id,
                format_timestamp(applied_at),
                i64::try_from(batch.updates.len()).unwrap_or(i64::MAX),
                body,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            day = %day_id,
            batch_id = %record.id,
            updates = batch.updates.len(),
            "applied batch"
        );
        Ok(record)
    }

    /// Lists journaled batches for a day, oldest first.
    pub fn list_batches(&self, day_id: &DayId) -> Result<Vec<BatchRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, day_id, applied_at, body
            FROM batches
            WHERE day_id = ?
            ORDER BY applied_at ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map(params![day_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut batches = Vec::new();
        for row in rows {
            let (id, day_id, applied_at, body) = row?;
            let applied_at = parse_timestamp(&applied_at, &id)?;
            let batch = serde_json::from_str(&body).map_err(|e| invalid(&id, e))?;
            batches.push(BatchRecord {
                id,
                day_id,
                applied_at,
                batch,
            });
        }
        Ok(batches)
    }
}

/// [`BatchPersistence`] port writing to one stored day.
pub struct DayStore<'a> {
    db: &'a mut Database,
    day_id: DayId,
}

impl<'a> DayStore<'a> {
    pub const fn new(db: &'a mut Database, day_id: DayId) -> Self {
        Self { db, day_id }
    }
}

impl BatchPersistence for DayStore<'_> {
    type Error = DbError;

    fn apply_batch(&mut self, batch: &ScheduleBatch) -> Result<(), Self::Error> {
        self.db.apply_batch(&self.day_id, batch)?;
        Ok(())
    }
}

/// Raw `entries` row.
struct EntryRow {
    id: String,
    track_id: String,
    start_time: Option<String>,
    duration: Option<i64>,
    order: Option<i64>,
    applies_to: String,
    payload: String,
}

impl EntryRow {
    fn into_entry(self) -> Result<Entry, DbError> {
        let id = EntryId::new(self.id.clone()).map_err(|e| invalid(&self.id, e))?;
        let track_id = TrackId::new(self.track_id).map_err(|e| invalid(&self.id, e))?;
        let applies_to: Vec<TrackId> =
            serde_json::from_str(&self.applies_to).map_err(|e| invalid(&self.id, e))?;
        let payload: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&self.payload).map_err(|e| invalid(&self.id, e))?;
        Ok(Entry {
            id,
            track_id,
            start_time: self.start_time,
            duration: self.duration,
            order: self.order,
            applies_to_track_ids: applies_to,
            payload,
        })
    }
}

fn encode_track_ids(ids: &[TrackId]) -> String {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect(),
    )
    .to_string()
}

fn invalid(id: &str, err: impl std::fmt::Display) -> DbError {
    DbError::InvalidData {
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn parse_date(date: &str, day_id: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|source| DbError::DateParse {
        day_id: day_id.to_string(),
        date: date.to_string(),
        source,
    })
}

fn parse_timestamp(timestamp: &str, batch_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            batch_id: batch_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
