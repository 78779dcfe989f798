use crate::workflows::gazette::NoticeRecord;
use crate::workflows::registry::serialize_fields;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.85;
pub const REVIEW_THRESHOLD: f64 = 0.5;

/// Score cut-offs separating accepted, review, and unmatched pairings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    accept: f64,
    review: f64,
}

impl Thresholds {
    pub fn new(accept: f64, review: f64) -> Result<Self, ThresholdError> {
        for (name, value) in [("accept", accept), ("review", review)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if review > accept {
            return Err(ThresholdError::Inverted { review, accept });
        }
        Ok(Self { accept, review })
    }

    /// Accept threshold override with the fixed review threshold.
    pub fn with_accept(accept: f64) -> Result<Self, ThresholdError> {
        Self::new(accept, REVIEW_THRESHOLD)
    }

    pub fn accept(&self) -> f64 {
        self.accept
    }

    pub fn review(&self) -> f64 {
        self.review
    }

    pub fn classify(&self, score: f64) -> MatchOutcome {
        if score >= self.accept {
            MatchOutcome::Accepted
        } else if score >= self.review {
            MatchOutcome::Review
        } else {
            MatchOutcome::Unmatched
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT_THRESHOLD,
            review: REVIEW_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("{name} threshold must lie within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("review threshold {review} exceeds accept threshold {accept}")]
    Inverted { review: f64, accept: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Accepted,
    Review,
    Unmatched,
}

/// A registry row paired with its best-scoring notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Position of the source row in the registry input.
    pub row_index: usize,
    /// Position of the chosen notice in extraction order.
    pub notice_index: usize,
    pub name_of_deceased: String,
    pub name_canonical: String,
    pub score: f64,
    pub outcome: MatchOutcome,
    pub cause_number: String,
    pub court_station: String,
    pub volume: String,
    pub date_published: String,
    /// Present on accepted results only.
    pub status: Option<String>,
    pub approval_date: Option<String>,
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, String)>,
}

/// A matchable row whose best score stayed below the review threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRow {
    pub row_index: usize,
    pub name_of_deceased: String,
    pub best_score: f64,
}

/// Partitioned output of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    pub accepted: Vec<MatchResult>,
    pub review: Vec<MatchResult>,
    pub unmatched_rows: Vec<UnmatchedRow>,
    /// Notices no registry row claimed, in extraction order.
    pub gazette_only: Vec<NoticeRecord>,
}

/// Result shape handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub accept_threshold: f64,
    pub review_threshold: f64,
    pub total_registry_rows: usize,
    pub total_notices_extracted: usize,
    pub accepted: Vec<MatchResult>,
    pub review: Vec<MatchResult>,
    pub unmatched_rows: Vec<UnmatchedRow>,
    pub gazette_only: Vec<NoticeRecord>,
}

impl ReconciliationReport {
    pub fn new(
        thresholds: Thresholds,
        total_registry_rows: usize,
        total_notices_extracted: usize,
        reconciliation: Reconciliation,
    ) -> Self {
        Self {
            accept_threshold: thresholds.accept(),
            review_threshold: thresholds.review(),
            total_registry_rows,
            total_notices_extracted,
            accepted: reconciliation.accepted,
            review: reconciliation.review,
            unmatched_rows: reconciliation.unmatched_rows,
            gazette_only: reconciliation.gazette_only,
        }
    }
}
