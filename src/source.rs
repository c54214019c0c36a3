//! Upstream schedule fetch: one GET against the widget endpoint, decoded
//! into day-groups. Decoding is deliberately permissive; the ingestor
//! validates required fields per unit so one malformed group cannot fail
//! the whole batch.

use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::{Europe::Berlin, Tz};
use serde::Deserialize;

use crate::config::SourceConfig;

#[derive(Debug, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub wodsets: Vec<DayGroup>,
}

#[derive(Debug, Deserialize)]
pub struct DayGroup {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub entries: Vec<WodEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WodEntry {
    #[serde(default)]
    pub wod_section: Option<String>,
    #[serde(default)]
    pub wod_title: Option<String>,
    #[serde(default)]
    pub workout: Option<WorkoutBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkoutBody {
    #[serde(default)]
    pub workout_name: Option<String>,
    #[serde(default)]
    pub workout_description: Option<String>,
    #[serde(default)]
    pub wod_results_url: Option<String>,
    #[serde(default)]
    pub wod_results_count: Option<i64>,
}

pub fn fetch(client: &reqwest::blocking::Client, cfg: &SourceConfig) -> anyhow::Result<Batch> {
    let days = cfg.days.to_string();
    let response = client
        .get(&cfg.url)
        .query(&[
            ("track_ids", cfg.track_id.as_str()),
            ("activity_length", "0"),
            ("leaderboard_length", "0"),
            ("days", days.as_str()),
            ("date", window_end(Utc::now().with_timezone(&Berlin)).as_str()),
        ])
        .header("Accept", "application/vnd.btwb.v1.webwidgets+json")
        .header("Authorization", &cfg.token)
        .send()
        .with_context(|| format!("failed to fetch workout schedule from {}", cfg.url))?
        .error_for_status()
        .context("workout schedule request was rejected")?;

    let bytes = response.bytes().context("failed to read schedule response")?;
    serde_json::from_slice(&bytes).context("failed to decode workout schedule")
}

/// The widget expects the requested window to end on a Sunday, formatted
/// like a JavaScript Date string, e.g.
/// `Sun Sep 14 2025 23:01:22 GMT+0200 (CEST)`.
fn window_end(today: DateTime<Tz>) -> String {
    let ahead = 7 - (today.weekday().num_days_from_monday() + 1) % 7;
    let sunday = today + Duration::days(ahead as i64);
    sunday.format("%a %b %d %Y %H:%M:%S GMT%z (%Z)").to_string()
}
