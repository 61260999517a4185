use crate::error::SelectionError;
use crate::record::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Values offered by the two sidebar multi-selects
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FilterOptions {
    /// Distinct `Lotação` values, ascending
    pub unit_options: Vec<String>,
    /// Distinct `Cargo` values, ascending
    pub title_options: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let units: BTreeSet<&str> = dataset.records.iter().map(|r| r.unit.as_str()).collect();
        let titles: BTreeSet<&str> = dataset.records.iter().map(|r| r.title.as_str()).collect();

        FilterOptions {
            unit_options: units.into_iter().map(str::to_string).collect(),
            title_options: titles.into_iter().map(str::to_string).collect(),
        }
    }
}

/// What the user picked in the sidebar
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub units: Vec<String>,
    pub titles: Vec<String>,
}

impl Selection {
    /// Creates a selection, collapsing repeated entries onto their first occurrence
    pub fn new<U, T>(units: U, titles: T) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Selection {
            units: dedup(units.into_iter().map(Into::into)),
            titles: dedup(titles.into_iter().map(Into::into)),
        }
    }

    /// Selection shown on the first visit
    ///
    /// The default unit is preselected only when the data contains it; every
    /// title is preselected.
    pub fn default_for(options: &FilterOptions, default_unit: &str) -> Self {
        let units = options
            .unit_options
            .iter()
            .filter(|unit| unit.as_str() == default_unit)
            .cloned()
            .collect();

        Selection {
            units,
            titles: options.title_options.clone(),
        }
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values.filter(|v| seen.insert(v.clone())).collect()
}

/// A selection that passed validation, with the title filter made explicit
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub units: BTreeSet<String>,
    pub titles: BTreeSet<String>,
}

impl ResolvedSelection {
    pub fn matches(&self, unit: &str, title: &str) -> bool {
        self.units.contains(unit) && self.titles.contains(title)
    }
}

/// Validate a selection and resolve an empty title list to every title option
///
/// The unit limit is checked before emptiness, so it applies regardless of
/// the titles picked. Values absent from the options are kept; they match no
/// row.
///
/// # Errors
/// * `SelectionError::TooManyUnits` when more than `max_units` units are picked
/// * `SelectionError::NoUnits` when no unit is picked
pub fn resolve(
    options: &FilterOptions,
    selection: &Selection,
    max_units: usize,
) -> Result<ResolvedSelection, SelectionError> {
    if selection.units.len() > max_units {
        return Err(SelectionError::TooManyUnits {
            selected: selection.units.len(),
            max: max_units,
        });
    }
    if selection.units.is_empty() {
        return Err(SelectionError::NoUnits);
    }

    let titles = if selection.titles.is_empty() {
        options.title_options.iter().cloned().collect()
    } else {
        selection.titles.iter().cloned().collect()
    };

    Ok(ResolvedSelection {
        units: selection.units.iter().cloned().collect(),
        titles,
    })
}
