use crate::infra::InMemoryMatchStore;
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use estate_recon::config::AppConfig;
use estate_recon::error::AppError;
use estate_recon::workflows::gazette::{
    ExtractionStats, NoticeRecord, TextSource, Utf8TextSource, VolumeMode,
};
use estate_recon::workflows::reconcile::{
    MatchRequest, MatchResponse, MatchResult, ReconcileServiceError, ReconciliationService,
};
use estate_recon::workflows::registry::RegistryImporter;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum VolumeModeArg {
    Global,
    Block,
}

impl From<VolumeModeArg> for VolumeMode {
    fn from(value: VolumeModeArg) -> Self {
        match value {
            VolumeModeArg::Global => VolumeMode::Global,
            VolumeModeArg::Block => VolumeMode::BlockLocal,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// Plain-text gazette extracted from the published document
    #[arg(long)]
    pub(crate) gazette: PathBuf,
    /// How issue numbers are attached to notices (defaults to RECON_VOLUME_MODE)
    #[arg(long, value_enum)]
    pub(crate) volume_mode: Option<VolumeModeArg>,
    /// Print notices and statistics as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReconcileArgs {
    /// Plain-text gazette extracted from the published document
    #[arg(long)]
    pub(crate) gazette: PathBuf,
    /// Registry export (CSV, header row first)
    #[arg(long)]
    pub(crate) registry: PathBuf,
    /// Accept threshold override for this run
    #[arg(long)]
    pub(crate) threshold: Option<f64>,
    /// Approval date stamped on accepted matches (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?.reconcile;
    if let Some(mode) = args.volume_mode {
        config.volume_mode = mode.into();
    }

    let document = std::fs::read(&args.gazette)?;
    let service = ReconciliationService::new(Arc::new(InMemoryMatchStore::default()), &config)
        .map_err(ReconcileServiceError::from)?;
    let extraction = service.extract_document(&document)?;

    if args.json {
        println!("{}", to_json(&extraction)?);
    } else {
        print!("{}", render_extraction(&extraction.notices, &extraction.stats));
    }
    Ok(())
}

pub(crate) fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?.reconcile;
    let store = match &config.snapshot_path {
        Some(path) => InMemoryMatchStore::with_snapshot(path)?,
        None => InMemoryMatchStore::default(),
    };
    let service = ReconciliationService::new(Arc::new(store), &config)
        .map_err(ReconcileServiceError::from)?;

    let gazette_text = Utf8TextSource.extract_text(&std::fs::read(&args.gazette)?)?;
    let registry_csv = std::fs::read_to_string(&args.registry)?;
    // Surface CSV problems with the file's own error before running.
    RegistryImporter::from_reader(registry_csv.as_bytes())?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let response = service.run(
        MatchRequest {
            gazette_text,
            registry_csv: Some(registry_csv),
            registry_rows: None,
            threshold: args.threshold,
        },
        today,
    )?;

    if args.json {
        println!("{}", to_json(&response)?);
    } else {
        print!("{}", render_reconciliation(&response));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Io(std::io::Error::other(err)))
}

pub(crate) fn render_extraction(notices: &[NoticeRecord], stats: &ExtractionStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Extracted {} notices across {} courts",
        stats.total_notices, stats.total_courts
    );

    if !stats.by_volume.is_empty() {
        let _ = writeln!(out, "\nBy volume");
        for volume in &stats.by_volume {
            let label = if volume.volume.is_empty() {
                "(none)"
            } else {
                volume.volume.as_str()
            };
            let _ = writeln!(out, "- {label}: {}", volume.total);
        }
    }

    if !stats.by_court.is_empty() {
        let _ = writeln!(out, "\nBy court");
        for court in &stats.by_court {
            let _ = writeln!(out, "- {}: {}", court.court_station, court.total);
        }
    }

    if !notices.is_empty() {
        let _ = writeln!(out, "\nNotices");
        for notice in notices {
            let _ = writeln!(
                out,
                "- {} | {} | {} | {}",
                notice.cause_number,
                notice.deceased_name_raw,
                notice.court_station,
                display_or_dash(&notice.date_published)
            );
        }
    }
    out
}

pub(crate) fn render_reconciliation(response: &MatchResponse) -> String {
    let report = &response.report;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Reconciled {} registry rows against {} notices (accept >= {:.2}, review >= {:.2})",
        report.total_registry_rows,
        report.total_notices_extracted,
        report.accept_threshold,
        report.review_threshold
    );

    render_matches(&mut out, "Accepted", &report.accepted);
    render_matches(&mut out, "Needs review", &report.review);

    if report.gazette_only.is_empty() {
        let _ = writeln!(out, "\nGazette only: none");
    } else {
        let _ = writeln!(out, "\nGazette only");
        for notice in &report.gazette_only {
            let _ = writeln!(
                out,
                "- {} | {} | {}",
                notice.cause_number, notice.deceased_name_raw, notice.court_station
            );
        }
    }

    let _ = writeln!(
        out,
        "\nStored {} new matches ({} flagged as duplicate names, {} failed batches)",
        response.inserted_count, response.duplicate_count, response.failed_batches
    );
    if response.duplicate_sweep_failed {
        let _ = writeln!(out, "Duplicate sweep failed; duplicate flags may be stale");
    }
    out
}

fn render_matches(out: &mut String, title: &str, matches: &[MatchResult]) {
    if matches.is_empty() {
        let _ = writeln!(out, "\n{title}: none");
        return;
    }

    let _ = writeln!(out, "\n{title}");
    for result in matches {
        let _ = writeln!(
            out,
            "- {} -> {} ({}, score {:.2})",
            result.name_of_deceased, result.cause_number, result.court_station, result.score
        );
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_recon::config::ReconcileConfig;
    use estate_recon::workflows::gazette::GazetteExtractor;

    const GAZETTE: &str = "Vol. CXXVI—No. 155
IN THE HIGH COURT OF KENYA AT NAIROBI
CAUSE NO. E123 OF 2024 By Jane Doe, of Nairobi, the deceased, on 6th September, 2024.
MAGISTRATE'S COURT AT THIKA
CAUSE NO. E7 OF 2024 By Mary Akinyi, of Thika, the deceased.";

    #[test]
    fn extraction_summary_lists_courts_and_notices() {
        let notices = GazetteExtractor::default().extract(GAZETTE);
        let stats = ExtractionStats::from_notices(&notices);
        let rendered = render_extraction(&notices, &stats);

        assert!(rendered.starts_with("Extracted 2 notices across 2 courts"));
        assert!(rendered.contains("- CXXVI—No. 155: 2"));
        assert!(rendered
            .contains("- E123 OF 2024 | Jane Doe | Nairobi High Court | 6th September, 2024"));
        assert!(rendered.contains("- E7 OF 2024 | Mary Akinyi | Thika Magistrate Court | -"));
    }

    #[test]
    fn reconciliation_summary_has_every_section() {
        let service = ReconciliationService::new(
            Arc::new(InMemoryMatchStore::default()),
            &ReconcileConfig::default(),
        )
        .expect("valid config");
        let response = service
            .run(
                MatchRequest {
                    gazette_text: GAZETTE.to_string(),
                    registry_csv: Some("Deceased\nJane Doe\nJanet Akinyi\n".to_string()),
                    registry_rows: None,
                    threshold: None,
                },
                NaiveDate::from_ymd_opt(2024, 9, 10).expect("valid date"),
            )
            .expect("run succeeds");
        let rendered = render_reconciliation(&response);

        assert!(rendered.contains("Reconciled 2 registry rows against 2 notices"));
        assert!(rendered.contains("- Jane Doe -> E123 OF 2024 (Nairobi High Court, score 1.00)"));
        assert!(rendered.contains("Needs review: none"));
        assert!(rendered.contains("- E7 OF 2024 | Mary Akinyi | Thika Magistrate Court"));
        assert!(rendered.contains("Stored 1 new matches"));
    }

    #[test]
    fn volume_mode_argument_maps_to_extractor_mode() {
        assert_eq!(VolumeMode::from(VolumeModeArg::Block), VolumeMode::BlockLocal);
        assert_eq!(VolumeMode::from(VolumeModeArg::Global), VolumeMode::Global);
    }
}
