//! Feed assembly: groups workout records by date, composes per-date HTML
//! with normalized line breaks, and derives stable entry identities.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Europe::Berlin;
use itertools::Itertools;
use regex::Regex;
use uuid::Uuid;

use crate::store::{SyncState, WorkoutRecord};

// Literal CR/LF and their escaped entity forms become explicit break
// markers; runs of two or more markers collapse to exactly one double
// break, so whitespace renders the same across feed readers.
static BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(&#13;|&#10;|\r|\n)").unwrap());
static BREAK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n*(<br/>\n*){2,}").unwrap());

/// The rendered unit: one feed entry per date that has at least one workout.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub link: String,
    pub published: DateTime<FixedOffset>,
    pub updated: DateTime<FixedOffset>,
}

/// Composed content for one date, shared between fingerprinting during
/// sync and entry assembly during render.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    pub heading: String,
    pub content: String,
    pub link: Option<String>,
}

pub fn compose(records: &[WorkoutRecord]) -> Composed {
    let mut raw = String::new();
    for record in records {
        raw.push_str(&format!(
            "<h3>{}</h3>\n<p>{}</p>\n\n",
            heading_of(record),
            record.description
        ));
    }
    let content = BREAKS.replace_all(&raw, "<br/>\n");
    let content = BREAK_RUNS
        .replace_all(&content, "\n<br/><br/>\n")
        .into_owned();

    Composed {
        heading: records.first().map(heading_of).unwrap_or_default(),
        content,
        link: records
            .iter()
            .find_map(|r| r.results_url.clone().filter(|url| !url.is_empty())),
    }
}

fn heading_of(record: &WorkoutRecord) -> String {
    record
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&record.name)
        .to_string()
}

/// Stable entry identity: a function of the date string alone, independent
/// of storage row ids, so it survives a full re-import of the store.
pub fn entry_id(date: NaiveDate) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        date.format("%Y-%m-%d").to_string().as_bytes(),
    )
}

pub fn entry_title(date: NaiveDate) -> String {
    format!("Workout for {}", date.format("%a %b %-d, %Y"))
}

fn to_berlin(instant: DateTime<chrono::Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&Berlin).fixed_offset()
}

/// Joins workouts with sync state into feed entries, ordered by date
/// ascending. `records` must already be ordered by (date, position), as
/// [`crate::store::all_workouts`] returns them. Entries whose workouts
/// carry no results URL link to `site_url`; the fallback is applied here
/// rather than in [`compose`] so fingerprints keep seeing the raw results
/// URL and a reconfigured site URL never reads as a content change.
pub fn assemble(
    records: &[WorkoutRecord],
    states: &HashMap<NaiveDate, SyncState>,
    site_url: &str,
) -> anyhow::Result<Vec<FeedEntry>> {
    let mut entries = Vec::new();
    for (date, group) in &records.iter().chunk_by(|r| r.date) {
        let group: Vec<WorkoutRecord> = group.cloned().collect();
        let state = states
            .get(&date)
            .ok_or_else(|| anyhow!("no sync state for {date}; run sync first"))?;
        let composed = compose(&group);
        entries.push(FeedEntry {
            id: entry_id(date),
            title: entry_title(date),
            content: composed.content,
            link: composed.link.unwrap_or_else(|| site_url.to_string()),
            published: to_berlin(state.created_at),
            updated: to_berlin(state.updated_at),
        });
    }
    Ok(entries)
}
