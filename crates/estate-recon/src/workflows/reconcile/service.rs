use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ReconciliationReport, ThresholdError, Thresholds};
use super::engine::Reconciler;
use super::store::{persist_accepted, MatchStore, StoreError, StoredMatch};
use crate::config::ReconcileConfig;
use crate::workflows::gazette::{
    ExtractionStats, GazetteExtractor, NoticeRecord, SourceError, TextSource, Utf8TextSource,
};
use crate::workflows::registry::{RegistryImportError, RegistryImporter, RegistryRow};

/// Input for one extract + reconcile run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    pub gazette_text: String,
    /// Registry export as CSV text, header row first.
    #[serde(default)]
    pub registry_csv: Option<String>,
    /// Registry rows already parsed into header/value objects.
    #[serde(default)]
    pub registry_rows: Option<Vec<BTreeMap<String, Value>>>,
    /// Per-run accept threshold override.
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    #[serde(flatten)]
    pub report: ReconciliationReport,
    pub inserted_count: usize,
    pub duplicate_count: usize,
    pub failed_batches: usize,
    pub duplicate_sweep_failed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResponse {
    pub notices: Vec<NoticeRecord>,
    pub stats: ExtractionStats,
}

/// Extract, reconcile, and persist behind one entry point.
pub struct ReconciliationService<S> {
    store: Arc<S>,
    source: Arc<dyn TextSource>,
    extractor: GazetteExtractor,
    thresholds: Thresholds,
    batch_size: usize,
    run_timeout: Duration,
}

impl<S> ReconciliationService<S>
where
    S: MatchStore + 'static,
{
    pub fn new(store: Arc<S>, config: &ReconcileConfig) -> Result<Self, ThresholdError> {
        Self::with_source(store, Arc::new(Utf8TextSource), config)
    }

    pub fn with_source(
        store: Arc<S>,
        source: Arc<dyn TextSource>,
        config: &ReconcileConfig,
    ) -> Result<Self, ThresholdError> {
        Ok(Self {
            store,
            source,
            extractor: GazetteExtractor::new(config.volume_mode),
            thresholds: Thresholds::with_accept(config.accept_threshold)?,
            batch_size: config.batch_size,
            run_timeout: config.run_timeout,
        })
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    pub fn extract(&self, gazette_text: &str) -> ExtractionResponse {
        let notices = self.extractor.extract(gazette_text);
        let stats = ExtractionStats::from_notices(&notices);
        ExtractionResponse { notices, stats }
    }

    /// Text extraction failures are returned unchanged.
    pub fn extract_document(&self, document: &[u8]) -> Result<ExtractionResponse, SourceError> {
        let text = self.source.extract_text(document)?;
        Ok(self.extract(&text))
    }

    /// Extract then reconcile then persist, in one call.
    pub fn run(
        &self,
        request: MatchRequest,
        today: NaiveDate,
    ) -> Result<MatchResponse, ReconcileServiceError> {
        let report = self.reconcile(request, today)?;
        Ok(self.persist(report))
    }

    /// Extraction and matching only. The store is not touched, so a caller
    /// that abandons this step leaves no trace of the run.
    pub fn reconcile(
        &self,
        request: MatchRequest,
        today: NaiveDate,
    ) -> Result<ReconciliationReport, ReconcileServiceError> {
        let thresholds = match request.threshold {
            Some(accept) => Thresholds::with_accept(accept)?,
            None => self.thresholds,
        };
        let rows = registry_rows(&request)?;
        let mut notices = self.extractor.extract(&request.gazette_text);
        let total_notices = notices.len();

        let reconciliation = Reconciler::new(thresholds, today).run(&rows, &mut notices);
        Ok(ReconciliationReport::new(
            thresholds,
            rows.len(),
            total_notices,
            reconciliation,
        ))
    }

    /// Stores the accepted results of a finished reconciliation.
    pub fn persist(&self, report: ReconciliationReport) -> MatchResponse {
        let summary = persist_accepted(self.store.as_ref(), &report.accepted, self.batch_size);
        MatchResponse {
            report,
            inserted_count: summary.inserted,
            duplicate_count: summary.flagged,
            failed_batches: summary.failed_batches,
            duplicate_sweep_failed: summary.sweep_failed,
        }
    }

    pub fn matches(&self) -> Result<Vec<StoredMatch>, ReconcileServiceError> {
        Ok(self.store.all()?)
    }

    pub fn clear(&self) -> Result<usize, ReconcileServiceError> {
        Ok(self.store.clear()?)
    }
}

fn registry_rows(request: &MatchRequest) -> Result<Vec<RegistryRow>, ReconcileServiceError> {
    if request.registry_csv.is_none() && request.registry_rows.is_none() {
        return Err(ReconcileServiceError::MissingRegistry);
    }

    let mut rows = Vec::new();
    if let Some(csv) = &request.registry_csv {
        rows.extend(RegistryImporter::from_reader(Cursor::new(csv.as_bytes()))?);
    }
    if let Some(objects) = &request.registry_rows {
        rows.extend(objects.iter().map(|object| {
            let fields = object
                .iter()
                .map(|(header, value)| (header.clone(), cell_text(value)))
                .collect();
            RegistryRow::from_fields(fields)
        }));
    }
    Ok(rows)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

/// Error raised by the reconciliation service.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileServiceError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Registry(#[from] RegistryImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("either registry_csv or registry_rows must be provided")]
    MissingRegistry,
    #[error("reconciliation exceeded its {0:?} budget")]
    TimedOut(Duration),
    #[error("reconciliation worker failed: {0}")]
    Worker(String),
}
