//! Filter-and-aggregate pipeline
//!
//! `render` is the whole dashboard minus I/O: it takes the loaded dataset and
//! the sidebar selection and decides what the page shows.

use crate::error::SelectionError;
use crate::record::{Dataset, Record};
use crate::selection::{self, FilterOptions, ResolvedSelection, Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between member names of one group
pub const MEMBER_SEPARATOR: &str = ", ";

/// One (unit, title) group of the filtered rows
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AggregateRow {
    pub unit: String,
    pub title: String,
    pub count: usize,
    pub members: String,
}

/// Everything needed to draw the chart and the table
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DashboardView {
    /// Groups ordered by (unit, title)
    pub aggregates: Vec<AggregateRow>,
    /// Units on the x axis, largest total first
    pub category_order: Vec<String>,
    /// Titles in legend order
    pub series_order: Vec<String>,
    /// Header of the table view
    pub headers: Vec<String>,
    /// Row-level filtered subset, in dataset order
    pub rows: Vec<Record>,
}

/// What one render of the page shows
///
/// The four states are mutually exclusive.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum RenderState {
    TooManyUnits { selected: usize, max: usize },
    NoUnitsSelected,
    NoMatchingData,
    Rendered(DashboardView),
}

impl RenderState {
    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            RenderState::Rendered(view) => Some(view),
            _ => None,
        }
    }
}

/// Run the pipeline for one interaction
///
/// # Arguments
/// * `dataset` - The loaded dataset
/// * `selection` - Units and titles picked in the sidebar
/// * `max_units` - Upper bound on the number of units
///
/// # Returns
/// * `RenderState` - What the page should display
pub fn render(dataset: &Dataset, selection: &Selection, max_units: usize) -> RenderState {
    let options = FilterOptions::from_dataset(dataset);

    let resolved = match selection::resolve(&options, selection, max_units) {
        Ok(resolved) => resolved,
        Err(SelectionError::TooManyUnits { selected, max }) => {
            return RenderState::TooManyUnits { selected, max };
        }
        Err(SelectionError::NoUnits) => return RenderState::NoUnitsSelected,
    };

    let rows = filter(dataset, &resolved);
    if rows.is_empty() {
        return RenderState::NoMatchingData;
    }

    let aggregates = aggregate(&rows);
    RenderState::Rendered(DashboardView {
        category_order: category_order(&aggregates),
        series_order: series_order(&aggregates),
        aggregates,
        headers: dataset.headers.clone(),
        rows: rows.into_iter().cloned().collect(),
    })
}

/// Rows whose unit and title are both selected, in dataset order
pub fn filter<'a>(dataset: &'a Dataset, resolved: &ResolvedSelection) -> Vec<&'a Record> {
    dataset
        .records
        .iter()
        .filter(|record| resolved.matches(&record.unit, &record.title))
        .collect()
}

/// Group rows by (unit, title), counting them and joining their names
///
/// Names keep the order in which the rows were passed in.
pub fn aggregate(rows: &[&Record]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(&str, &str), Vec<&str>> = BTreeMap::new();
    for record in rows {
        groups
            .entry((record.unit.as_str(), record.title.as_str()))
            .or_default()
            .push(record.name.as_str());
    }

    groups
        .into_iter()
        .map(|((unit, title), names)| AggregateRow {
            unit: unit.to_string(),
            title: title.to_string(),
            count: names.len(),
            members: names.join(MEMBER_SEPARATOR),
        })
        .collect()
}

/// Units ordered by descending total count; ties stay in ascending unit order
pub fn category_order(aggregates: &[AggregateRow]) -> Vec<String> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for row in aggregates {
        *totals.entry(row.unit.as_str()).or_insert(0) += row.count;
    }

    let mut ordered: Vec<(&str, usize)> = totals.into_iter().collect();
    // stable sort keeps the BTreeMap order among equal totals
    ordered.sort_by(|a, b| b.1.cmp(&a.1));
    ordered.into_iter().map(|(unit, _)| unit.to_string()).collect()
}

/// Titles in order of first appearance among the aggregate rows
pub fn series_order(aggregates: &[AggregateRow]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for row in aggregates {
        if !order.contains(&row.title) {
            order.push(row.title.clone());
        }
    }
    order
}
