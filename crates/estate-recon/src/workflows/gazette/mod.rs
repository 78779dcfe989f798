//! Gazette notice extraction.
//!
//! Raw gazette text is tokenized into court headings, volume markers, and
//! `CAUSE NO.` delimited bodies, then each body is assembled into a
//! [`NoticeRecord`] when it carries both a cause number and a deceased name.

mod court;
mod dates;
mod scanner;
pub mod source;
pub mod stats;

pub use court::{normalize_station, CourtKind, UNKNOWN_COURT};
pub use source::{FallbackTextSource, SourceError, TextSource, Utf8TextSource};
pub use stats::{CourtBreakdown, ExtractionStats, VolumeCount};

use crate::workflows::names::{canonicalize, CanonicalName};
use chrono::NaiveDate;
use court::CourtIndex;
use regex::Regex;
use scanner::{BodyText, GazetteToken, VolumeToken};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info};

static CAUSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z])\s*(\d{1,5})\s*OF\s*(\d{4})\b").expect("valid regex")
});

static DECEASED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bBy\s+(?:\(\d+\)\s+)?(.*?),\s.*?the\s+deceased").expect("valid regex")
});

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("valid regex"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// One estate notice parsed out of the gazette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeRecord {
    /// Case identifier as printed, e.g. `E123 OF 2024`.
    pub cause_number: String,
    pub deceased_name_raw: String,
    #[serde(rename = "deceased_name_canonical", serialize_with = "serialize_canonical")]
    pub canonical_name: CanonicalName,
    /// Issue identifier in effect for this notice; empty when none was printed.
    pub volume: String,
    /// Publication date as printed; empty when no valid date was found.
    pub date_published: String,
    pub published_on: Option<NaiveDate>,
    pub court_station: String,
    /// Set by the reconciler once a registry row has claimed this notice.
    pub matched: bool,
}

fn serialize_canonical<S>(name: &CanonicalName, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&name.canonical)
}

/// How issue identifiers are attached to notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    /// The first `Vol. … No. …` marker in the document applies to every notice.
    #[default]
    Global,
    /// Each notice takes the latest marker printed before its cause marker;
    /// notices before any marker carry an empty volume.
    BlockLocal,
}

impl VolumeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Some(VolumeMode::Global),
            "block" | "block_local" | "block-local" => Some(VolumeMode::BlockLocal),
            _ => None,
        }
    }
}

/// Collapse line breaks to spaces and whitespace runs to a single space.
pub fn normalize_layout(text: &str) -> String {
    let joined = LINE_BREAKS.replace_all(text, " ");
    WHITESPACE_RUNS.replace_all(&joined, " ").into_owned()
}

/// Extract notices using [`VolumeMode::Global`].
pub fn extract(text: &str) -> Vec<NoticeRecord> {
    GazetteExtractor::default().extract(text)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteExtractor {
    volume_mode: VolumeMode,
}

impl GazetteExtractor {
    pub fn new(volume_mode: VolumeMode) -> Self {
        Self { volume_mode }
    }

    /// Total over any input: unrecognizable blocks are dropped and a document
    /// without notices yields an empty vector.
    pub fn extract(&self, text: &str) -> Vec<NoticeRecord> {
        let text = normalize_layout(text);
        let tokens = scanner::scan(&text);

        let mut courts = CourtIndex::default();
        let mut volumes: Vec<VolumeToken<'_>> = Vec::new();
        let mut blocks: Vec<(usize, BodyText<'_>)> = Vec::new();
        let mut marker_offset = 0;

        for token in tokens {
            match token {
                GazetteToken::Heading(heading) => courts.push(heading.offset, heading.text),
                GazetteToken::Volume(volume) => volumes.push(volume),
                GazetteToken::CauseMarker(marker) => marker_offset = marker.span.start,
                GazetteToken::Body(body) => blocks.push((marker_offset, body)),
            }
        }

        let global_volume = volumes
            .first()
            .map(|volume| volume.label.to_string())
            .unwrap_or_default();

        let mut notices = Vec::new();
        for (marker_offset, body) in blocks {
            let volume = match self.volume_mode {
                VolumeMode::Global => global_volume.clone(),
                VolumeMode::BlockLocal => latest_volume_before(&volumes, marker_offset),
            };

            match assemble_notice(&body, &courts, volume) {
                Some(notice) => notices.push(notice),
                None => debug!(offset = body.offset, "dropping unrecognizable gazette block"),
            }
        }

        info!(
            notices = notices.len(),
            headings = courts.len(),
            volumes = volumes.len(),
            "gazette extraction finished"
        );
        notices
    }
}

fn latest_volume_before(volumes: &[VolumeToken<'_>], offset: usize) -> String {
    let after = volumes.partition_point(|volume| volume.offset < offset);
    after
        .checked_sub(1)
        .map(|index| volumes[index].label.to_string())
        .unwrap_or_default()
}

fn assemble_notice(
    body: &BodyText<'_>,
    courts: &CourtIndex,
    volume: String,
) -> Option<NoticeRecord> {
    let cause_number = find_cause_number(body.text)?;
    let deceased_name_raw = find_deceased_name(body.text)?;
    let canonical_name = canonicalize(&deceased_name_raw);
    let court_station = courts.station_for(body.offset);
    let (date_published, published_on) = match dates::find_publication_date(body.text) {
        Some(found) => (found.text, Some(found.date)),
        None => (String::new(), None),
    };

    Some(NoticeRecord {
        cause_number,
        deceased_name_raw,
        canonical_name,
        volume,
        date_published,
        published_on,
        court_station,
        matched: false,
    })
}

fn find_cause_number(block: &str) -> Option<String> {
    let captures = CAUSE_NUMBER.captures(block)?;
    Some(format!(
        "{}{} OF {}",
        captures[1].to_ascii_uppercase(),
        &captures[2],
        &captures[3]
    ))
}

fn find_deceased_name(block: &str) -> Option<String> {
    let captures = DECEASED_NAME.captures(block)?;
    let name = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THIKA_NOTICE: &str = "MAGISTRATE'S COURT AT THIKA\n\
CAUSE NO. E123 OF 2024\n\
TAKE NOTICE that, a petition has been filed in this court\n\
By Jane Doe, of Thika, the deceased, who died on 5th May, 2024.";

    #[test]
    fn extracts_single_notice_with_court_and_cause() {
        let notices = extract(THIKA_NOTICE);
        assert_eq!(notices.len(), 1);
        let notice = &notices[0];
        assert_eq!(notice.cause_number, "E123 OF 2024");
        assert_eq!(notice.court_station, "Thika Magistrate Court");
        assert_eq!(notice.deceased_name_raw, "Jane Doe");
        assert_eq!(notice.canonical_name.canonical, "jane doe");
        assert_eq!(notice.date_published, "5th May, 2024");
        assert_eq!(notice.published_on, NaiveDate::from_ymd_opt(2024, 5, 5));
        assert!(!notice.matched);
    }

    #[test]
    fn extraction_is_total() {
        for text in ["", "   ", "no markers at all", "CAUSE NO.", "CAUSE NO. CAUSE NO."] {
            assert!(extract(text).is_empty(), "expected no notices for {text:?}");
        }
    }

    #[test]
    fn drops_blocks_without_cause_number_or_name() {
        let text = "CAUSE NO. 12 OF 2024 By John Smith, the deceased \
CAUSE NO. E7 OF 2023 petition without a name \
CAUSE NO. E8 OF 2023 By Mary Akinyi, late of Kisumu, the deceased";
        let notices = extract(text);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].cause_number, "E8 OF 2023");
        assert_eq!(notices[0].deceased_name_raw, "Mary Akinyi");
        assert_eq!(notices[0].court_station, UNKNOWN_COURT);
    }

    #[test]
    fn strips_numbered_petitioner_prefix() {
        let text = "CAUSE NO. E9 OF 2024 By (2) Peter  Otieno Odhiambo, of Kisumu, the deceased";
        let notices = extract(text);
        assert_eq!(notices[0].deceased_name_raw, "Peter Otieno Odhiambo");
    }

    #[test]
    fn normalizes_cause_number_spacing_and_case() {
        let text = "cause no. e 45of2022 By Ann Wambui, the deceased";
        assert_eq!(extract(text)[0].cause_number, "E45 OF 2022");
    }

    #[test]
    fn global_volume_applies_to_every_notice() {
        let text = "Vol. CXXVI—No. 155 CAUSE NO. E1 OF 2024 By A One, the deceased \
Vol. CXXVI—No. 156 CAUSE NO. E2 OF 2024 By B Two, the deceased";
        let notices = GazetteExtractor::new(VolumeMode::Global).extract(text);
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|notice| notice.volume == "CXXVI—No. 155"));
    }

    #[test]
    fn block_local_volume_carries_forward() {
        let text = "CAUSE NO. E0 OF 2024 By Z Zero, the deceased \
Vol. CXXVI—No. 155 CAUSE NO. E1 OF 2024 By A One, the deceased \
CAUSE NO. E2 OF 2024 By B Two, the deceased \
Vol. CXXVI—No. 156 CAUSE NO. E3 OF 2024 By C Three, the deceased";
        let volumes: Vec<String> = GazetteExtractor::new(VolumeMode::BlockLocal)
            .extract(text)
            .into_iter()
            .map(|notice| notice.volume)
            .collect();
        assert_eq!(
            volumes,
            vec!["", "CXXVI—No. 155", "CXXVI—No. 155", "CXXVI—No. 156"]
        );
    }

    #[test]
    fn notices_take_nearest_preceding_heading_in_document_order() {
        let text = "IN THE HIGH COURT OF KENYA AT NAIROBI\n\
CAUSE NO. E1 OF 2024 By Alpha Kamau, the deceased\n\
CHIEF MAGISTRATE'S COURT AT MOMBASA\n\
CAUSE NO. E2 OF 2024 By Beta Hassan, the deceased\n\
CAUSE NO. E3 OF 2024 By Gamma Ali, the deceased";
        let notices = extract(text);
        let stations: Vec<&str> = notices
            .iter()
            .map(|notice| notice.court_station.as_str())
            .collect();
        assert_eq!(
            stations,
            vec![
                "Nairobi High Court",
                "Mombasa Chief Magistrate Court",
                "Mombasa Chief Magistrate Court"
            ]
        );
        let names: Vec<&str> = notices
            .iter()
            .map(|notice| notice.deceased_name_raw.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha Kamau", "Beta Hassan", "Gamma Ali"]);
    }

    #[test]
    fn layout_normalization_collapses_breaks_and_runs() {
        assert_eq!(normalize_layout("a\r\nb\n\nc   d\te"), "a b c d\te");
    }

    #[test]
    fn volume_mode_parses_config_values() {
        assert_eq!(VolumeMode::parse("GLOBAL"), Some(VolumeMode::Global));
        assert_eq!(VolumeMode::parse("block"), Some(VolumeMode::BlockLocal));
        assert_eq!(VolumeMode::parse("per-page"), None);
    }
}
