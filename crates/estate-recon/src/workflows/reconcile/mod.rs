//! Registry-to-gazette reconciliation.
//!
//! Each registry row is scored against every extracted notice by token-set
//! similarity and lands in one of three tiers. Accepted results are handed
//! to a [`MatchStore`]; notices nobody claimed are reported as gazette-only.

pub mod domain;
pub mod engine;
pub mod router;
pub mod service;
pub mod similarity;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    MatchOutcome, MatchResult, Reconciliation, ReconciliationReport, ThresholdError, Thresholds,
    UnmatchedRow, DEFAULT_ACCEPT_THRESHOLD, REVIEW_THRESHOLD,
};
pub use engine::{reconcile, Reconciler, PUBLISHED_STATUS};
pub use router::reconciliation_router;
pub use service::{
    ExtractionResponse, MatchRequest, MatchResponse, ReconcileServiceError,
    ReconciliationService,
};
pub use similarity::jaccard;
pub use store::{
    duplicate_names, mark_duplicates, persist_accepted, BatchReport, MatchStore, PersistSummary,
    StoreError, StoredMatch,
};
