mod columns;

use crate::workflows::names::{canonicalize, CanonicalName};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RegistryImportError {
    #[error("failed to read registry export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid registry CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// One registry entry: the original columns in header order plus the
/// deceased name derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryRow {
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, String)>,
    pub name_raw: String,
    #[serde(rename = "name_canonical", serialize_with = "serialize_canonical")]
    pub canonical_name: CanonicalName,
}

impl RegistryRow {
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        let name_raw = columns::deceased_name(&fields);
        let canonical_name = canonicalize(&name_raw);
        Self {
            fields,
            name_raw,
            canonical_name,
        }
    }

    /// Explicit status column, if the export carries a non-blank one.
    pub fn status(&self) -> Option<&str> {
        columns::lookup(&self.fields, columns::STATUS_HEADERS)
    }

    pub fn approval_date(&self) -> Option<&str> {
        columns::lookup(&self.fields, columns::APPROVAL_DATE_HEADERS)
    }

    /// Rows without a usable name never take part in matching.
    pub fn is_matchable(&self) -> bool {
        !self.canonical_name.is_empty()
    }
}

/// Header-ordered cells as a JSON object.
pub(crate) fn serialize_fields<S>(
    fields: &[(String, String)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (header, value) in fields {
        map.serialize_entry(header, value)?;
    }
    map.end()
}

fn serialize_canonical<S>(name: &CanonicalName, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&name.canonical)
}

/// Reads registry exports (first table, header row first) into rows.
pub struct RegistryImporter;

impl RegistryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RegistryRow>, RegistryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RegistryRow>, RegistryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut rows = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            let fields = headers
                .iter()
                .enumerate()
                .map(|(index, header)| {
                    let value = record.get(index).unwrap_or_default();
                    (header.to_string(), value.to_string())
                })
                .collect();
            rows.push(RegistryRow::from_fields(fields));
        }

        tracing::debug!(rows = rows.len(), "registry export parsed");
        Ok(rows)
    }
}
