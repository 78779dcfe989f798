use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{MatchOutcome, MatchResult};

/// Persisted form of an accepted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMatch {
    pub name_of_deceased: String,
    pub normalized_name: String,
    pub cause_number: String,
    pub court_station: String,
    pub volume: String,
    pub date_published: String,
    pub status: String,
    pub approval_date: String,
    pub score: f64,
    pub match_type: MatchOutcome,
    #[serde(default)]
    pub duplicate: bool,
    /// Remaining registry columns.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl StoredMatch {
    pub fn from_result(result: &MatchResult) -> Self {
        Self {
            name_of_deceased: result.name_of_deceased.clone(),
            normalized_name: result.name_canonical.clone(),
            cause_number: result.cause_number.clone(),
            court_station: result.court_station.clone(),
            volume: result.volume.clone(),
            date_published: result.date_published.clone(),
            status: result.status.clone().unwrap_or_default(),
            approval_date: result.approval_date.clone().unwrap_or_default(),
            score: result.score,
            match_type: result.outcome,
            duplicate: false,
            fields: result.fields.iter().cloned().collect(),
        }
    }

    /// Uniqueness key: two records with the same key are the same match.
    pub fn key(&self) -> (&str, &str, &str) {
        (
            self.name_of_deceased.as_str(),
            self.cause_number.as_str(),
            self.court_station.as_str(),
        )
    }
}

/// Outcome of one batch insert. Colliding keys are skipped, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Durable storage for accepted matches.
pub trait MatchStore: Send + Sync {
    fn insert_batch(&self, batch: Vec<StoredMatch>) -> Result<BatchReport, StoreError>;
    /// Marks every record whose registry name is shared; returns how many
    /// records carry the flag afterwards.
    fn flag_duplicates(&self) -> Result<usize, StoreError>;
    fn all(&self) -> Result<Vec<StoredMatch>, StoreError>;
    /// Removes every record, returning how many were deleted.
    fn clear(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("match store unavailable: {0}")]
    Unavailable(String),
    #[error("match snapshot could not be written: {0}")]
    Snapshot(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed_batches: usize,
    pub flagged: usize,
    pub sweep_failed: bool,
}

/// Inserts accepted results in batches of at most `batch_size`, then runs
/// the duplicate sweep. Failed batches and a failed sweep are logged and
/// counted; neither discards what was already inserted.
pub fn persist_accepted<S>(
    store: &S,
    accepted: &[MatchResult],
    batch_size: usize,
) -> PersistSummary
where
    S: MatchStore + ?Sized,
{
    let mut summary = PersistSummary::default();
    if accepted.is_empty() {
        return summary;
    }

    for (batch_index, chunk) in accepted.chunks(batch_size.max(1)).enumerate() {
        let batch = chunk.iter().map(StoredMatch::from_result).collect();
        match store.insert_batch(batch) {
            Ok(report) => {
                summary.inserted += report.inserted;
                summary.duplicates += report.duplicates;
            }
            Err(error) => {
                warn!(batch_index, size = chunk.len(), %error, "match batch insert failed");
                summary.failed_batches += 1;
            }
        }
    }

    match store.flag_duplicates() {
        Ok(flagged) => summary.flagged = flagged,
        Err(error) => {
            warn!(%error, "duplicate sweep failed");
            summary.sweep_failed = true;
        }
    }

    info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed_batches = summary.failed_batches,
        flagged = summary.flagged,
        sweep_failed = summary.sweep_failed,
        "accepted matches persisted"
    );
    summary
}

/// Registry names held by more than one record.
pub fn duplicate_names(records: &[StoredMatch]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let name = record.name_of_deceased.trim();
        if !name.is_empty() {
            *counts.entry(name).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Applies [`duplicate_names`] to `records` in place; returns the flagged count.
pub fn mark_duplicates(records: &mut [StoredMatch]) -> usize {
    let names = duplicate_names(records);
    let mut flagged = 0;
    for record in records.iter_mut() {
        record.duplicate = names.contains(record.name_of_deceased.trim());
        if record.duplicate {
            flagged += 1;
        }
    }
    flagged
}
