use super::NoticeRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeCount {
    pub volume: String,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtBreakdown {
    pub court_station: String,
    pub total: usize,
    pub volumes: Vec<VolumeCount>,
}

/// Counts over one extraction, grouped by issue and by court.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExtractionStats {
    pub total_notices: usize,
    pub total_courts: usize,
    pub by_volume: Vec<VolumeCount>,
    /// Busiest court first; ties ordered by station name.
    pub by_court: Vec<CourtBreakdown>,
}

impl ExtractionStats {
    pub fn from_notices(notices: &[NoticeRecord]) -> Self {
        let mut by_volume: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_court: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut stations = BTreeSet::new();

        for notice in notices {
            *by_volume.entry(notice.volume.as_str()).or_default() += 1;
            *by_court
                .entry(notice.court_station.as_str())
                .or_default()
                .entry(notice.volume.as_str())
                .or_default() += 1;
            stations.insert(notice.court_station.as_str());
        }

        let mut by_court: Vec<CourtBreakdown> = by_court
            .into_iter()
            .map(|(station, volumes)| CourtBreakdown {
                court_station: station.to_string(),
                total: volumes.values().sum(),
                volumes: to_counts(volumes),
            })
            .collect();
        by_court.sort_by(|left, right| {
            right
                .total
                .cmp(&left.total)
                .then_with(|| left.court_station.cmp(&right.court_station))
        });

        Self {
            total_notices: notices.len(),
            total_courts: stations.len(),
            by_volume: to_counts(by_volume),
            by_court,
        }
    }
}

fn to_counts(counts: BTreeMap<&str, usize>) -> Vec<VolumeCount> {
    counts
        .into_iter()
        .map(|(volume, total)| VolumeCount {
            volume: volume.to_string(),
            total,
        })
        .collect()
}
