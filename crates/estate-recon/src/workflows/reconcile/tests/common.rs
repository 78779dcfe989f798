use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::ReconcileConfig;
use crate::workflows::reconcile::store::{
    mark_duplicates, BatchReport, MatchStore, StoreError, StoredMatch,
};
use crate::workflows::reconcile::{reconciliation_router, MatchRequest, ReconciliationService};

pub(super) const GAZETTE: &str = "THE KENYA GAZETTE Vol. CXXVI—No. 155 NAIROBI, 6th September, 2024
IN THE HIGH COURT OF KENYA AT NAIROBI
CAUSE NO. E123 OF 2024
By Jane Doe, of Nairobi, the deceased, who died on 5th May, 2024.
CAUSE NO. E124 OF 2024
By Peter Otieno Odhiambo, of Nairobi, the deceased.
MAGISTRATE'S COURT AT THIKA
CAUSE NO. E7 OF 2024
By Mary Akinyi Onyango, of Thika, the deceased.";

pub(super) const REGISTRY_CSV: &str = "\
Name of the Deceased,Court
Mrs. Jane Doe,Nairobi
Peter Odhiambo,Nairobi
Janet Doe,Nairobi
,Thika";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 10).expect("valid date")
}

pub(super) fn config() -> ReconcileConfig {
    ReconcileConfig {
        batch_size: 2,
        ..ReconcileConfig::default()
    }
}

pub(super) fn csv_request() -> MatchRequest {
    MatchRequest {
        gazette_text: GAZETTE.to_string(),
        registry_csv: Some(REGISTRY_CSV.to_string()),
        ..MatchRequest::default()
    }
}

pub(super) fn build_service() -> (
    ReconciliationService<MemoryStore>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::default());
    let service = ReconciliationService::new(store.clone(), &config()).expect("valid config");
    (service, store)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) records: Mutex<Vec<StoredMatch>>,
    pub(super) batches: Mutex<Vec<usize>>,
}

impl MatchStore for MemoryStore {
    fn insert_batch(&self, batch: Vec<StoredMatch>) -> Result<BatchReport, StoreError> {
        self.batches
            .lock()
            .expect("batch mutex poisoned")
            .push(batch.len());

        let mut records = self.records.lock().expect("store mutex poisoned");
        let mut report = BatchReport::default();
        for record in batch {
            if records.iter().any(|existing| existing.key() == record.key()) {
                report.duplicates += 1;
            } else {
                records.push(record);
                report.inserted += 1;
            }
        }
        Ok(report)
    }

    fn flag_duplicates(&self) -> Result<usize, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        Ok(mark_duplicates(&mut records))
    }

    fn all(&self) -> Result<Vec<StoredMatch>, StoreError> {
        Ok(self.records.lock().expect("store mutex poisoned").clone())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let deleted = records.len();
        records.clear();
        Ok(deleted)
    }
}

/// Fails every insert; reads succeed with nothing stored.
pub(super) struct FlakyStore;

impl MatchStore for FlakyStore {
    fn insert_batch(&self, _batch: Vec<StoredMatch>) -> Result<BatchReport, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn flag_duplicates(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    fn all(&self) -> Result<Vec<StoredMatch>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn clear(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Accepts inserts but cannot complete the duplicate sweep.
#[derive(Default)]
pub(super) struct SweepFailingStore {
    pub(super) inner: MemoryStore,
}

impl MatchStore for SweepFailingStore {
    fn insert_batch(&self, batch: Vec<StoredMatch>) -> Result<BatchReport, StoreError> {
        self.inner.insert_batch(batch)
    }

    fn flag_duplicates(&self) -> Result<usize, StoreError> {
        Err(StoreError::Snapshot("disk full".to_string()))
    }

    fn all(&self) -> Result<Vec<StoredMatch>, StoreError> {
        self.inner.all()
    }

    fn clear(&self) -> Result<usize, StoreError> {
        self.inner.clear()
    }
}

/// A gazette and registry large enough that matching takes measurable time.
pub(super) fn bulky_request(notices: usize) -> MatchRequest {
    let mut gazette = String::from(GAZETTE);
    let mut registry = String::from("Name of the Deceased\nJane Doe\n");
    for index in 0..notices {
        gazette.push_str(&format!(
            "\nCAUSE NO. E{} OF 2023\nBy Wanjiku Filler Kamau, of Nyeri, the deceased.",
            index + 1000
        ));
        registry.push_str("Wanjiku Kamau Filler\n");
    }
    MatchRequest {
        gazette_text: gazette,
        registry_csv: Some(registry),
        ..MatchRequest::default()
    }
}

pub(super) fn json_row(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(header, value)| (header.to_string(), value.clone()))
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service<S>(service: ReconciliationService<S>) -> axum::Router
where
    S: MatchStore + 'static,
{
    reconciliation_router(Arc::new(service))
}
