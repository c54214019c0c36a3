//! Change tracking: decides, per date, whether the current content is new,
//! unchanged, or modified since the last run, and assigns the feed-visible
//! timestamps.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::store::SyncState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Created,
    Unchanged,
    Updated,
}

/// Reconciles one run's candidate fingerprints against prior sync state.
///
/// `now` is threaded in explicitly rather than read from the ambient clock,
/// so a reconcile step is a pure function of (prior state, candidate, now).
/// Each changed entry in the run gets `now` plus a strictly increasing whole-
/// second offset: when more entries change in one run than the clock can
/// resolve, consumers sorting by `updated` still see a deterministic total
/// order.
pub struct Reconciler {
    now: DateTime<Utc>,
    bumped: i64,
}

impl Reconciler {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, bumped: 0 }
    }

    pub fn reconcile(
        &mut self,
        prior: Option<SyncState>,
        date: NaiveDate,
        candidate: &str,
    ) -> (SyncState, Outcome) {
        match prior {
            None => (
                SyncState {
                    date,
                    created_at: self.now,
                    updated_at: self.now,
                    fingerprint: candidate.to_string(),
                },
                Outcome::Created,
            ),
            Some(state) if state.fingerprint == candidate => (state, Outcome::Unchanged),
            Some(state) => {
                self.bumped += 1;
                (
                    SyncState {
                        updated_at: self.now + Duration::seconds(self.bumped),
                        fingerprint: candidate.to_string(),
                        ..state
                    },
                    Outcome::Updated,
                )
            }
        }
    }
}
