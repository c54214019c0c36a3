use chrono::NaiveDate;
use rusqlite::Connection;

use crate::source::{Batch, WodEntry};
use crate::store::{self, WorkoutRecord};

#[derive(Debug, Default, PartialEq)]
pub struct IngestReport {
    pub stored: usize,
    pub skipped_groups: usize,
    pub skipped_items: usize,
}

/// Writes one workout row per (date, position), replacing any prior row
/// with the same key, so re-running on the same batch is idempotent. A
/// malformed group or item is reported and skipped; it never aborts the
/// rest of the batch.
pub fn ingest(conn: &Connection, batch: &Batch) -> anyhow::Result<IngestReport> {
    let mut report = IngestReport::default();
    for group in &batch.wodsets {
        let date = group
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let date = match date {
            Some(date) => date,
            None => {
                eprintln!(
                    "warning: skipping day-group with missing or malformed date ({:?})",
                    group.date
                );
                report.skipped_groups += 1;
                continue;
            }
        };
        for (position, entry) in group.entries.iter().enumerate() {
            match to_record(date, position as i64, entry) {
                Some(record) => {
                    store::upsert_workout(conn, &record)?;
                    report.stored += 1;
                }
                None => {
                    eprintln!(
                        "warning: skipping workout {position} of {date}: missing required field"
                    );
                    report.skipped_items += 1;
                }
            }
        }
    }
    Ok(report)
}

fn to_record(date: NaiveDate, position: i64, entry: &WodEntry) -> Option<WorkoutRecord> {
    let section = entry.wod_section.clone()?;
    let workout = entry.workout.as_ref()?;
    Some(WorkoutRecord {
        date,
        position,
        section,
        title: entry.wod_title.clone(),
        name: workout.workout_name.clone()?,
        description: workout.workout_description.clone()?,
        results_url: workout.wod_results_url.clone(),
        results_count: workout.wod_results_count,
    })
}
