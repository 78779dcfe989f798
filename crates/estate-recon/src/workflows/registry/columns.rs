/// Accepted headers for the deceased's name, most specific first. Compared
/// after [`normalize_header`].
pub(crate) const NAME_HEADERS: &[&str] = &[
    "name of the deceased",
    "name of deceased",
    "name deceased",
    "deceased name",
    "deceased s name",
    "name deceased s",
    "full name",
    "fullname",
    "deceased",
    "name",
];

pub(crate) const STATUS_HEADERS: &[&str] = &["status at gp", "status"];

pub(crate) const APPROVAL_DATE_HEADERS: &[&str] = &["approval date"];

/// Lower-case, repair mis-decoded apostrophes, and reduce every run of
/// non-alphanumerics to one space.
pub(crate) fn normalize_header(header: &str) -> String {
    let repaired = header.replace("â€™", "'").to_lowercase();
    let mut normalized = String::with_capacity(repaired.len());
    let mut in_gap = false;

    for ch in repaired.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            normalized.push(ch);
            in_gap = false;
        } else if !in_gap {
            normalized.push(' ');
            in_gap = true;
        }
    }

    normalized.trim().to_string()
}

/// First non-blank value whose header matches one of `aliases`, trying
/// aliases in order.
pub(crate) fn lookup<'a>(fields: &'a [(String, String)], aliases: &[&str]) -> Option<&'a str> {
    let normalized: Vec<(String, &str)> = fields
        .iter()
        .map(|(header, value)| (normalize_header(header), value.trim()))
        .collect();

    aliases.iter().find_map(|alias| {
        normalized
            .iter()
            .find(|(header, value)| header == alias && !value.is_empty())
            .map(|(_, value)| *value)
    })
}

/// Best-effort deceased name: a known alias, else the first non-blank column
/// whose header mentions "deceased". Empty when nothing qualifies.
pub(crate) fn deceased_name(fields: &[(String, String)]) -> String {
    if let Some(value) = lookup(fields, NAME_HEADERS) {
        return value.to_string();
    }

    fields
        .iter()
        .find(|(header, value)| {
            normalize_header(header).contains("deceased") && !value.trim().is_empty()
        })
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}
