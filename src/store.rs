//! Sqlite-backed record store.
//!
//! Two tables: `workouts`, keyed by (date, seq) with replace-on-conflict
//! semantics, and `sync_state`, one row per date that has ever produced a
//! feed entry. A [`rusqlite::Transaction`] is the unit of atomicity: each
//! command opens one session, performs all reads and writes through it, and
//! either commits or drops it untouched.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Transaction, params};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS workouts (
    date TEXT NOT NULL,
    seq INTEGER NOT NULL,
    section TEXT NOT NULL,
    title TEXT,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    results_url TEXT,
    results_count INTEGER,
    PRIMARY KEY (date, seq)
);
CREATE TABLE IF NOT EXISTS sync_state (
    date TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    fingerprint TEXT NOT NULL
);
";

/// One scheduled workout. `(date, position)` is unique; re-ingesting the
/// same key overwrites the prior row in place.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub date: NaiveDate,
    pub position: i64,
    pub section: String,
    pub title: Option<String>,
    pub name: String,
    pub description: String,
    pub results_url: Option<String>,
    pub results_count: Option<i64>,
}

/// Synchronization state for one date. `created_at` is set exactly once;
/// `updated_at` moves only when `fingerprint` does.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fingerprint: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("failed to initialize store schema")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory store")?;
        conn.execute_batch(SCHEMA)
            .context("failed to initialize store schema")?;
        Ok(Self { conn })
    }

    /// Begin a scoped session. Dropping the transaction without committing
    /// leaves the store exactly as it was.
    pub fn session(&mut self) -> anyhow::Result<Transaction<'_>> {
        self.conn.transaction().context("failed to begin session")
    }
}

pub fn upsert_workout(conn: &Connection, record: &WorkoutRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO workouts
         (date, seq, section, title, name, description, results_url, results_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            date_key(record.date),
            record.position,
            record.section,
            record.title,
            record.name,
            record.description,
            record.results_url,
            record.results_count,
        ],
    )
    .with_context(|| format!("failed to store workout for {}", record.date))?;
    Ok(())
}

/// Distinct workout dates, ascending.
pub fn distinct_dates(conn: &Connection) -> anyhow::Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT DISTINCT date FROM workouts ORDER BY date")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut dates = Vec::new();
    for row in rows {
        dates.push(parse_date(&row?)?);
    }
    Ok(dates)
}

pub fn workouts_for_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<WorkoutRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, seq, section, title, name, description, results_url, results_count
         FROM workouts WHERE date = ?1 ORDER BY seq",
    )?;
    let rows = stmt.query_map(params![date_key(date)], read_workout_row)?;
    collect_workouts(rows)
}

/// All workouts ordered by (date, seq), the assembler's input order.
pub fn all_workouts(conn: &Connection) -> anyhow::Result<Vec<WorkoutRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, seq, section, title, name, description, results_url, results_count
         FROM workouts ORDER BY date, seq",
    )?;
    let rows = stmt.query_map([], read_workout_row)?;
    collect_workouts(rows)
}

pub fn sync_state(conn: &Connection, date: NaiveDate) -> anyhow::Result<Option<SyncState>> {
    let mut stmt = conn.prepare(
        "SELECT date, created_at, updated_at, fingerprint FROM sync_state WHERE date = ?1",
    )?;
    match stmt.query_row(params![date_key(date)], read_state_row) {
        Ok(raw) => Ok(Some(raw_to_state(raw)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read sync state for {date}")),
    }
}

pub fn all_sync_states(conn: &Connection) -> anyhow::Result<HashMap<NaiveDate, SyncState>> {
    let mut stmt =
        conn.prepare("SELECT date, created_at, updated_at, fingerprint FROM sync_state")?;
    let rows = stmt.query_map([], read_state_row)?;
    let mut states = HashMap::new();
    for row in rows {
        let state = raw_to_state(row?)?;
        states.insert(state.date, state);
    }
    Ok(states)
}

/// First insert of a date's state. Returns false when the row already
/// exists, so a lost insert race falls through to the update-or-noop path.
pub fn insert_sync_state(conn: &Connection, state: &SyncState) -> anyhow::Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO sync_state (date, created_at, updated_at, fingerprint)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                date_key(state.date),
                state.created_at.to_rfc3339(),
                state.updated_at.to_rfc3339(),
                state.fingerprint,
            ],
        )
        .with_context(|| format!("failed to insert sync state for {}", state.date))?;
    Ok(inserted > 0)
}

/// `created_at` is immutable once set, so the update never touches it.
pub fn update_sync_state(conn: &Connection, state: &SyncState) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE sync_state SET updated_at = ?2, fingerprint = ?3 WHERE date = ?1",
        params![
            date_key(state.date),
            state.updated_at.to_rfc3339(),
            state.fingerprint,
        ],
    )
    .with_context(|| format!("failed to update sync state for {}", state.date))?;
    Ok(())
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("malformed date in store: {raw:?}"))
}

fn parse_instant(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("malformed timestamp in store: {raw:?}"))?
        .with_timezone(&Utc))
}

type RawWorkout = (
    String,
    i64,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    Option<i64>,
);

fn read_workout_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWorkout> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn collect_workouts(
    rows: impl Iterator<Item = rusqlite::Result<RawWorkout>>,
) -> anyhow::Result<Vec<WorkoutRecord>> {
    let mut records = Vec::new();
    for row in rows {
        let (date, position, section, title, name, description, results_url, results_count) = row?;
        records.push(WorkoutRecord {
            date: parse_date(&date)?,
            position,
            section,
            title,
            name,
            description,
            results_url,
            results_count,
        });
    }
    Ok(records)
}

type RawState = (String, String, String, String);

fn read_state_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawState> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn raw_to_state(raw: RawState) -> anyhow::Result<SyncState> {
    let (date, created_at, updated_at, fingerprint) = raw;
    Ok(SyncState {
        date: parse_date(&date)?,
        created_at: parse_instant(&created_at)?,
        updated_at: parse_instant(&updated_at)?,
        fingerprint,
    })
}
