use super::domain::{
    MatchOutcome, MatchResult, Reconciliation, ThresholdError, Thresholds, UnmatchedRow,
};
use super::similarity::jaccard;
use crate::workflows::gazette::NoticeRecord;
use crate::workflows::registry::RegistryRow;
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

pub const PUBLISHED_STATUS: &str = "Published";
const APPROVAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Matches registry rows to gazette notices, one best candidate per row.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    thresholds: Thresholds,
    today: NaiveDate,
}

impl Reconciler {
    pub fn new(thresholds: Thresholds, today: NaiveDate) -> Self {
        Self { thresholds, today }
    }

    /// Rows are scored independently; a notice may be claimed by several
    /// rows. Only the `matched` flags of `notices` are written, and they are
    /// cleared first so claims from an earlier run do not carry over.
    pub fn run(&self, rows: &[RegistryRow], notices: &mut [NoticeRecord]) -> Reconciliation {
        let mut reconciliation = Reconciliation::default();
        for notice in notices.iter_mut() {
            notice.matched = false;
        }

        for (row_index, row) in rows.iter().enumerate() {
            if !row.is_matchable() {
                debug!(row_index, "skipping registry row without a usable name");
                continue;
            }

            let Some((notice_index, score)) = best_candidate(row, notices) else {
                reconciliation.unmatched_rows.push(UnmatchedRow {
                    row_index,
                    name_of_deceased: row.name_raw.clone(),
                    best_score: 0.0,
                });
                continue;
            };

            let outcome = self.thresholds.classify(score);
            if outcome == MatchOutcome::Unmatched {
                reconciliation.unmatched_rows.push(UnmatchedRow {
                    row_index,
                    name_of_deceased: row.name_raw.clone(),
                    best_score: score,
                });
                continue;
            }

            let notice = &mut notices[notice_index];
            notice.matched = true;
            let result = self.merge(row_index, row, notice_index, notice, score, outcome);

            match outcome {
                MatchOutcome::Accepted => reconciliation.accepted.push(result),
                _ => reconciliation.review.push(result),
            }
        }

        reconciliation.gazette_only = notices
            .iter()
            .filter(|notice| !notice.matched)
            .cloned()
            .collect();

        info!(
            rows = rows.len(),
            notices = notices.len(),
            accepted = reconciliation.accepted.len(),
            review = reconciliation.review.len(),
            gazette_only = reconciliation.gazette_only.len(),
            "reconciliation finished"
        );
        reconciliation
    }

    fn merge(
        &self,
        row_index: usize,
        row: &RegistryRow,
        notice_index: usize,
        notice: &NoticeRecord,
        score: f64,
        outcome: MatchOutcome,
    ) -> MatchResult {
        let (status, approval_date) = if outcome == MatchOutcome::Accepted {
            let status = row.status().unwrap_or(PUBLISHED_STATUS).to_string();
            let approval_date = row
                .approval_date()
                .map(str::to_string)
                .unwrap_or_else(|| self.today.format(APPROVAL_DATE_FORMAT).to_string());
            (Some(status), Some(approval_date))
        } else {
            (None, None)
        };

        MatchResult {
            row_index,
            notice_index,
            name_of_deceased: row.name_raw.clone(),
            name_canonical: row.canonical_name.canonical.clone(),
            score,
            outcome,
            cause_number: notice.cause_number.clone(),
            court_station: notice.court_station.clone(),
            volume: notice.volume.clone(),
            date_published: notice.date_published.clone(),
            status,
            approval_date,
            fields: row.fields.clone(),
        }
    }
}

/// Highest positive score; the earliest notice wins ties.
fn best_candidate(row: &RegistryRow, notices: &[NoticeRecord]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, notice) in notices.iter().enumerate() {
        let score = jaccard(&row.canonical_name.tokens, &notice.canonical_name.tokens);
        let current = best.map(|(_, score)| score).unwrap_or(0.0);
        if score > current {
            best = Some((index, score));
        }
    }
    best
}

/// One-shot reconciliation stamped with today's local date.
pub fn reconcile(
    rows: &[RegistryRow],
    notices: &mut [NoticeRecord],
    accept_threshold: f64,
    review_threshold: f64,
) -> Result<Reconciliation, ThresholdError> {
    let thresholds = Thresholds::new(accept_threshold, review_threshold)?;
    let today = Local::now().date_naive();
    Ok(Reconciler::new(thresholds, today).run(rows, notices))
}
