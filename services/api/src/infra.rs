use chrono::NaiveDate;
use estate_recon::workflows::reconcile::{
    mark_duplicates, BatchReport, MatchStore, StoreError, StoredMatch,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local match store, optionally mirrored to a JSON snapshot that is
/// loaded at startup and rewritten after every mutation.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMatchStore {
    records: Arc<Mutex<Vec<StoredMatch>>>,
    snapshot: Option<PathBuf>,
}

impl InMemoryMatchStore {
    pub(crate) fn with_snapshot(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = load_snapshot(&path)?;
        info!(path = %path.display(), records = records.len(), "match snapshot loaded");
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
            snapshot: Some(path),
        })
    }

    /// Writes `next` to the snapshot, then swaps it in. A failed write
    /// leaves the in-memory records as they were.
    fn commit(
        &self,
        current: &mut Vec<StoredMatch>,
        next: Vec<StoredMatch>,
    ) -> Result<(), StoreError> {
        if let Some(path) = &self.snapshot {
            save_snapshot(path, &next)?;
        }
        *current = next;
        Ok(())
    }
}

impl MatchStore for InMemoryMatchStore {
    fn insert_batch(&self, batch: Vec<StoredMatch>) -> Result<BatchReport, StoreError> {
        let mut guard = self.records.lock().expect("match store mutex poisoned");
        let mut keys: BTreeSet<(String, String, String)> = guard.iter().map(owned_key).collect();
        let mut staged = guard.clone();
        let mut report = BatchReport::default();

        for record in batch {
            if keys.insert(owned_key(&record)) {
                staged.push(record);
                report.inserted += 1;
            } else {
                debug!(cause_number = %record.cause_number, "skipping duplicate match");
                report.duplicates += 1;
            }
        }

        if report.inserted > 0 {
            self.commit(&mut guard, staged)?;
        }
        Ok(report)
    }

    fn flag_duplicates(&self) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("match store mutex poisoned");
        let mut staged = guard.clone();
        let flagged = mark_duplicates(&mut staged);
        self.commit(&mut guard, staged)?;
        Ok(flagged)
    }

    fn all(&self) -> Result<Vec<StoredMatch>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("match store mutex poisoned")
            .clone())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("match store mutex poisoned");
        let deleted = guard.len();
        self.commit(&mut guard, Vec::new())?;
        Ok(deleted)
    }
}

fn owned_key(record: &StoredMatch) -> (String, String, String) {
    let (name, cause, court) = record.key();
    (name.to_string(), cause.to_string(), court.to_string())
}

fn load_snapshot(path: &Path) -> Result<Vec<StoredMatch>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|err| StoreError::Unavailable(format!("{}: {err}", path.display())))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw)
        .map_err(|err| StoreError::Unavailable(format!("{}: {err}", path.display())))
}

fn save_snapshot(path: &Path, records: &[StoredMatch]) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(records)
        .map_err(|err| StoreError::Snapshot(err.to_string()))?;
    std::fs::write(path, payload)
        .map_err(|err| StoreError::Snapshot(format!("{}: {err}", path.display())))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
