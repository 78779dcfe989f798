use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Station used when no heading precedes a notice.
pub const UNKNOWN_COURT: &str = "Unknown Court";

static HIGH_COURT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)IN\s+THE\s+HIGH\s+COURT\s+OF\s+KENYA\s+AT").expect("valid regex")
});
static CHIEF_MAGISTRATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CHIEF\s+MAGISTRATE\S*\s+COURT\s+AT").expect("valid regex")
});
static MAGISTRATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)MAGISTRATE\S*\s+COURT\s+(?:AT|OF)").expect("valid regex")
});
static HIGH_COURT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)HIGH\s+COURT").expect("valid regex"));
static CHIEF_MAGISTRATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CHIEF\s+MAGISTRATE").expect("valid regex"));
static MAGISTRATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)MAGISTRATE").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtKind {
    HighCourt,
    ChiefMagistrate,
    Magistrate,
}

impl CourtKind {
    pub fn label(self) -> &'static str {
        match self {
            CourtKind::HighCourt => "High Court",
            CourtKind::ChiefMagistrate => "Chief Magistrate Court",
            CourtKind::Magistrate => "Magistrate Court",
        }
    }

    fn detect(heading: &str) -> Option<Self> {
        if HIGH_COURT.is_match(heading) {
            Some(CourtKind::HighCourt)
        } else if CHIEF_MAGISTRATE.is_match(heading) {
            Some(CourtKind::ChiefMagistrate)
        } else if MAGISTRATE.is_match(heading) {
            Some(CourtKind::Magistrate)
        } else {
            None
        }
    }
}

/// Normalize a printed heading into `<City> <Court Type>`.
///
/// `"MAGISTRATE'S COURT AT THIKA"` becomes `"Thika Magistrate Court"`. A heading
/// naming no known court type keeps only the title-cased remainder.
pub fn normalize_station(heading: &str) -> String {
    let city = [
        &*HIGH_COURT_PREFIX,
        &*CHIEF_MAGISTRATE_PREFIX,
        &*MAGISTRATE_PREFIX,
    ]
    .iter()
    .fold(heading.to_string(), |remaining, prefix| {
        prefix.replace(&remaining, "").into_owned()
    });
    let city = title_case(city.trim());

    match CourtKind::detect(heading) {
        Some(kind) => format!("{city} {}", kind.label()),
        None => city,
    }
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CourtHeading {
    pub(crate) offset: usize,
    pub(crate) station: String,
}

/// Headings sorted by document offset.
#[derive(Debug, Default)]
pub(crate) struct CourtIndex {
    headings: Vec<CourtHeading>,
}

impl CourtIndex {
    pub(crate) fn push(&mut self, offset: usize, heading: &str) {
        let heading = CourtHeading {
            offset,
            station: normalize_station(heading),
        };
        let position = self
            .headings
            .partition_point(|existing| existing.offset <= offset);
        self.headings.insert(position, heading);
    }

    /// Nearest heading strictly before `offset`.
    pub(crate) fn preceding(&self, offset: usize) -> Option<&CourtHeading> {
        let after = self
            .headings
            .partition_point(|heading| heading.offset < offset);
        after.checked_sub(1).map(|index| &self.headings[index])
    }

    pub(crate) fn station_for(&self, offset: usize) -> String {
        self.preceding(offset)
            .map(|heading| heading.station.clone())
            .unwrap_or_else(|| UNKNOWN_COURT.to_string())
    }

    pub(crate) fn len(&self) -> usize {
        self.headings.len()
    }
}
