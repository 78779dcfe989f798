use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static WRITTEN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([A-Z]+),?\s+(\d{4})\b").expect("valid regex")
});

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[–-](\d{1,2})[–-](\d{4})\b").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PublicationDate {
    /// Date text as printed.
    pub(crate) text: String,
    pub(crate) date: NaiveDate,
}

/// First valid calendar date in the block: written forms ("12th September,
/// 2024") are preferred over numeric day-month-year forms ("12-9-2024").
pub(crate) fn find_publication_date(block: &str) -> Option<PublicationDate> {
    let written = WRITTEN_DATE.captures_iter(block).find_map(|captures| {
        let candidate = format!("{} {} {}", &captures[1], &captures[2], &captures[3]);
        let date = NaiveDate::parse_from_str(&candidate, "%d %B %Y").ok()?;
        Some(PublicationDate {
            text: captures[0].to_string(),
            date,
        })
    });

    written.or_else(|| {
        NUMERIC_DATE.captures_iter(block).find_map(|captures| {
            let day = captures[1].parse().ok()?;
            let month = captures[2].parse().ok()?;
            let year = captures[3].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(PublicationDate {
                text: captures[0].to_string(),
                date,
            })
        })
    })
}
