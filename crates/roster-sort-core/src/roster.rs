use crate::error::Error;
use crate::normalize::sanitize_folder_part;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One expected submitter. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    /// Explicit `index` column, or the 1-based row position when absent.
    pub id: String,
    pub surname: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
}

impl RosterRecord {
    pub fn new(
        id: impl Into<String>,
        surname: Option<&str>,
        first_name: Option<&str>,
        middle_name: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            surname: non_empty(surname),
            first_name: non_empty(first_name),
            middle_name: non_empty(middle_name),
        }
    }

    /// Present name fields in surname, first, middle order.
    pub fn name_fields(&self) -> impl Iterator<Item = &str> {
        [&self.surname, &self.first_name, &self.middle_name]
            .into_iter()
            .filter_map(|field| field.as_deref())
    }

    pub fn has_name(&self) -> bool {
        self.name_fields().next().is_some()
    }

    /// `<id>_<surname>_<first_name>`, stable for a given record.
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}_{}",
            sanitize_folder_part(Some(self.id.as_str())),
            sanitize_folder_part(self.surname.as_deref()),
            sanitize_folder_part(self.first_name.as_deref()),
        )
    }

    pub fn display_name(&self) -> String {
        self.name_fields().collect::<Vec<_>>().join(" ")
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RosterRow {
    index: Option<String>,
    surname: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
}

/// Ordered roster. Iteration order is load order and is the tie-break for
/// matching.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<RosterRecord>,
}

impl Roster {
    pub fn new(records: Vec<RosterRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::MissingRoster(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let roster = Self::from_reader(file)?;
        debug!("Loaded {} roster records from {}", roster.len(), path.display());
        Ok(roster)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in ["surname", "first_name"] {
            if !headers.iter().any(|h| h == required) {
                warn!("Roster has no '{}' column", required);
            }
        }

        let mut records = Vec::new();
        for (position, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = row?;
            let id = non_empty(row.index.as_deref()).unwrap_or_else(|| (position + 1).to_string());
            let record = RosterRecord::new(
                id,
                row.surname.as_deref(),
                row.first_name.as_deref(),
                row.middle_name.as_deref(),
            );
            if !record.has_name() {
                warn!("Roster record '{}' has no name fields and will never match", record.id);
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn get(&self, position: usize) -> Option<&RosterRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RosterRecord> {
        self.records.iter()
    }
}
