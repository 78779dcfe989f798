use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static CAUSE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CAUSE\s+NO\.").expect("valid regex"));

static COURT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)IN\s+THE\s+HIGH\s+COURT\s+OF\s+KENYA\s+AT\s+[A-Z]+|CHIEF\s+MAGISTRATE\S*\s+COURT\s+AT\s+[A-Z]+|MAGISTRATE\S*\s+COURT\s+(?:AT|OF)\s+[A-Z]+",
    )
    .expect("valid regex")
});

static VOLUME_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Vol\.\s*([A-Z0-9—–\-.\s]+?No\.\s*\d+)").expect("valid regex")
});

/// Court heading printed above a run of notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadingToken<'a> {
    pub(crate) offset: usize,
    pub(crate) text: &'a str,
}

/// Issue identifier such as `CXXVI—No. 155`, without the `Vol.` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VolumeToken<'a> {
    pub(crate) offset: usize,
    pub(crate) label: &'a str,
}

/// A `CAUSE NO.` marker; every notice starts with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CauseMarkerToken {
    pub(crate) span: Range<usize>,
}

/// Text owned by the preceding cause marker, trimmed, up to the next marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BodyText<'a> {
    pub(crate) offset: usize,
    pub(crate) text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GazetteToken<'a> {
    Heading(HeadingToken<'a>),
    Volume(VolumeToken<'a>),
    CauseMarker(CauseMarkerToken),
    Body(BodyText<'a>),
}

impl GazetteToken<'_> {
    pub(crate) fn offset(&self) -> usize {
        match self {
            GazetteToken::Heading(token) => token.offset,
            GazetteToken::Volume(token) => token.offset,
            GazetteToken::CauseMarker(token) => token.span.start,
            GazetteToken::Body(token) => token.offset,
        }
    }
}

/// Tokenize normalized gazette text into a stream ordered by offset.
///
/// Headings and volume markers are positional annotations: they may fall
/// inside a body, and the body text still contains them. Text before the
/// first cause marker yields no body.
pub(crate) fn scan(text: &str) -> Vec<GazetteToken<'_>> {
    let mut tokens: Vec<GazetteToken<'_>> = COURT_HEADING
        .find_iter(text)
        .map(|found| {
            GazetteToken::Heading(HeadingToken {
                offset: found.start(),
                text: found.as_str(),
            })
        })
        .collect();

    tokens.extend(VOLUME_MARKER.captures_iter(text).filter_map(|captures| {
        let whole = captures.get(0)?;
        let label = captures.get(1)?;
        Some(GazetteToken::Volume(VolumeToken {
            offset: whole.start(),
            label: label.as_str().trim(),
        }))
    }));

    let markers: Vec<Range<usize>> = CAUSE_MARKER
        .find_iter(text)
        .map(|found| found.range())
        .collect();

    for (index, marker) in markers.iter().enumerate() {
        let body_end = markers
            .get(index + 1)
            .map(|next| next.start)
            .unwrap_or(text.len());
        let raw = &text[marker.end..body_end];
        let trimmed = raw.trim_start();
        let offset = marker.end + (raw.len() - trimmed.len());

        tokens.push(GazetteToken::CauseMarker(CauseMarkerToken {
            span: marker.clone(),
        }));

        let trimmed = trimmed.trim_end();
        if !trimmed.is_empty() {
            tokens.push(GazetteToken::Body(BodyText {
                offset,
                text: trimmed,
            }));
        }
    }

    tokens.sort_by_key(GazetteToken::offset);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies<'a>(tokens: &[GazetteToken<'a>]) -> Vec<&'a str> {
        tokens
            .iter()
            .filter_map(|token| match token {
                GazetteToken::Body(body) => Some(body.text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn splits_bodies_on_cause_markers_and_drops_preamble() {
        let text = "Preamble text CAUSE NO. E1 OF 2024 first body cause no. E2 OF 2024 second body";
        let tokens = scan(text);
        assert_eq!(
            bodies(&tokens),
            vec!["E1 OF 2024 first body", "E2 OF 2024 second body"]
        );
    }

    #[test]
    fn body_offsets_point_into_source_text() {
        let text = "CAUSE NO.   E1 OF 2024 body";
        let tokens = scan(text);
        let body = tokens
            .iter()
            .find_map(|token| match token {
                GazetteToken::Body(body) => Some(body.clone()),
                _ => None,
            })
            .expect("body token");
        assert_eq!(&text[body.offset..body.offset + body.text.len()], body.text);
    }

    #[test]
    fn empty_bodies_are_not_emitted() {
        let tokens = scan("CAUSE NO. CAUSE NO.   ");
        assert!(bodies(&tokens).is_empty());
        let markers = tokens
            .iter()
            .filter(|token| matches!(token, GazetteToken::CauseMarker(_)))
            .count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn recognizes_all_heading_forms() {
        let text = "IN THE HIGH COURT OF KENYA AT NAIROBI x \
CHIEF MAGISTRATE'S COURT AT MOMBASA y \
Magistrate's Court of Kisumu z \
MAGISTRATE COURT AT THIKA";
        let headings: Vec<&str> = scan(text)
            .into_iter()
            .filter_map(|token| match token {
                GazetteToken::Heading(heading) => Some(heading.text),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                "IN THE HIGH COURT OF KENYA AT NAIROBI",
                "CHIEF MAGISTRATE'S COURT AT MOMBASA",
                "Magistrate's Court of Kisumu",
                "MAGISTRATE COURT AT THIKA",
            ]
        );
    }

    #[test]
    fn captures_volume_labels_without_prefix() {
        let tokens = scan("THE KENYA GAZETTE Vol. CXXVI—No. 155 NAIROBI");
        let label = tokens
            .iter()
            .find_map(|token| match token {
                GazetteToken::Volume(volume) => Some(volume.label),
                _ => None,
            })
            .expect("volume token");
        assert_eq!(label, "CXXVI—No. 155");
    }

    #[test]
    fn tokens_are_ordered_by_offset() {
        let text = "Vol. CXXVI—No. 1 CHIEF MAGISTRATE'S COURT AT NYERI CAUSE NO. E5 OF 2024 By A B, the deceased";
        let offsets: Vec<usize> = scan(text).iter().map(GazetteToken::offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert_eq!(offsets.len(), 4);
    }
}
