use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;

use crate::config::SourceConfig;
use crate::store::{self, Store};
use crate::tracker::{Outcome, Reconciler};
use crate::{assemble, fingerprint, http, ingest, source};

/// Fetch the upstream schedule and reconcile it into the store. The fetch
/// happens before the write session opens, so a source failure leaves the
/// store exactly as it was.
pub(crate) fn cmd_sync(db_path: &Path) -> anyhow::Result<()> {
    let cfg = SourceConfig::from_env()?;
    let client = http::http_client()?;

    eprint!("Fetching workout schedule...");
    let batch = source::fetch(&client, &cfg)?;
    eprintln!(" done ({} day-groups).", batch.wodsets.len());

    let mut db = Store::open(db_path)?;
    let tx = db.session()?;

    let report = ingest::ingest(&tx, &batch)?;
    reconcile_all(&tx, Utc::now())?;
    tx.commit().context("failed to commit synchronize session")?;

    eprintln!("Stored {} workouts.", report.stored);
    if report.skipped_groups > 0 || report.skipped_items > 0 {
        eprintln!(
            "warning: skipped {} day-groups and {} workouts",
            report.skipped_groups, report.skipped_items
        );
    }
    Ok(())
}

/// Runs the change tracker over every distinct date in the store, in
/// ascending date order so same-run timestamp offsets are deterministic.
pub(crate) fn reconcile_all(conn: &Connection, now: DateTime<Utc>) -> anyhow::Result<()> {
    let mut reconciler = Reconciler::new(now);
    for date in store::distinct_dates(conn)? {
        let records = store::workouts_for_date(conn, date)?;
        let composed = assemble::compose(&records);
        let candidate = fingerprint::fingerprint(
            &composed.heading,
            &composed.content,
            composed.link.as_deref().unwrap_or(""),
        );
        let prior = store::sync_state(conn, date)?;
        apply(conn, &mut reconciler, prior, date, &candidate)?;
    }
    Ok(())
}

fn apply(
    conn: &Connection,
    reconciler: &mut Reconciler,
    prior: Option<store::SyncState>,
    date: NaiveDate,
    candidate: &str,
) -> anyhow::Result<()> {
    let (state, outcome) = reconciler.reconcile(prior, date, candidate);
    match outcome {
        Outcome::Created => {
            if !store::insert_sync_state(conn, &state)? {
                // Lost an insert race; reconcile against the row that won.
                eprintln!("warning: sync state for {date} already exists, re-reading");
                let prior = store::sync_state(conn, date)?;
                let (state, outcome) = reconciler.reconcile(prior, date, candidate);
                if outcome == Outcome::Updated {
                    store::update_sync_state(conn, &state)?;
                }
            }
        }
        Outcome::Updated => store::update_sync_state(conn, &state)?,
        Outcome::Unchanged => {}
    }
    Ok(())
}
