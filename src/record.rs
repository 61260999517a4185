use serde::{Deserialize, Serialize};

/// Header of the organizational unit column
pub const UNIT_COLUMN: &str = "Lotação";
/// Header of the job title column
pub const TITLE_COLUMN: &str = "Cargo";
/// Header of the person name column
pub const NAME_COLUMN: &str = "Nome";

/// One personnel row of the source table
///
/// The three required attributes are lifted out of the raw row; `fields`
/// keeps every column verbatim, in header order, for the table view.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Record {
    pub unit: String,
    pub title: String,
    pub name: String,
    pub fields: Vec<String>,
}

impl Record {
    /// Builds a record with no pass-through columns
    pub fn new(unit: &str, title: &str, name: &str) -> Self {
        Record {
            unit: unit.to_string(),
            title: title.to_string(),
            name: name.to_string(),
            fields: vec![unit.to_string(), title.to_string(), name.to_string()],
        }
    }
}

/// The loaded table: header row plus records free of nulls in the required columns
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset from bare records, using the three required columns as header
    pub fn from_records(records: Vec<Record>) -> Self {
        Dataset {
            headers: vec![
                UNIT_COLUMN.to_string(),
                TITLE_COLUMN.to_string(),
                NAME_COLUMN.to_string(),
            ],
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
