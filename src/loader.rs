use crate::error::LoadError;
use crate::record::{Dataset, NAME_COLUMN, Record, TITLE_COLUMN, UNIT_COLUMN};
use csv::{ReaderBuilder, StringRecord};
use lazy_static::lazy_static;
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

lazy_static! {
    /// Raw field texts read as missing values
    static ref NULL_MARKERS: HashSet<&'static str> = [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect();
}

/// Returns true when a raw CSV field counts as a missing value
///
/// Matching is exact: `" NA"` is a value, `"NA"` is not.
pub fn is_null(field: &str) -> bool {
    NULL_MARKERS.contains(field)
}

/// Load the personnel dataset from a CSV file
///
/// Reads a comma-delimited file with a header row and drops, unconditionally,
/// every row whose `Lotação`, `Cargo` or `Nome` is missing.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Dataset, LoadError>` - The cleaned dataset or an error
///
/// # Errors
/// * `LoadError::NotFound` if the file does not exist
/// * `LoadError::MissingColumn` if one of the required headers is absent
/// * `LoadError::Csv` if the content cannot be parsed
///
/// # Examples
/// ```no_run
/// use lotacao_dashboard::loader::load_dataset;
///
/// match load_dataset("servidores.csv") {
///     Ok(dataset) => println!("Loaded {} records", dataset.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load_dataset(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = filepath.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io(e),
    })?;

    let dataset = from_reader(file, path)?;
    info!(
        "Loaded {} records with {} columns from {}",
        dataset.len(),
        dataset.headers.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV content from any reader
///
/// `source` is only used to name the input in errors and log lines.
pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Dataset, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let unit_idx = column_index(&headers, UNIT_COLUMN, source)?;
    let title_idx = column_index(&headers, TITLE_COLUMN, source)?;
    let name_idx = column_index(&headers, NAME_COLUMN, source)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    let mut row = StringRecord::new();

    while csv_reader.read_record(&mut row)? {
        let unit = required_field(&row, unit_idx);
        let title = required_field(&row, title_idx);
        let name = required_field(&row, name_idx);

        match (unit, title, name) {
            (Some(unit), Some(title), Some(name)) => records.push(Record {
                unit: unit.to_string(),
                title: title.to_string(),
                name: name.to_string(),
                fields: (0..headers.len())
                    .map(|i| row.get(i).unwrap_or_default().to_string())
                    .collect(),
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        info!(
            "Dropped {} rows with missing {}, {} or {} from {}",
            dropped,
            UNIT_COLUMN,
            TITLE_COLUMN,
            NAME_COLUMN,
            source.display()
        );
    } else {
        debug!("No rows dropped from {}", source.display());
    }

    Ok(Dataset { headers, records })
}

fn column_index(headers: &[String], column: &str, source: &Path) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| LoadError::MissingColumn {
            path: source.to_path_buf(),
            column: column.to_string(),
        })
}

// Short rows leave trailing columns absent, which counts as missing
fn required_field(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).filter(|value| !is_null(value))
}
