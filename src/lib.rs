/*!
# Cargos por Lotação

A single-page dashboard over a CSV of active civil servants, showing how many
people hold each job title (`Cargo`) in each organizational unit (`Lotação`).

## Overview

The dashboard loads the personnel file once, lets the user pick up to five
units and any number of titles in a sidebar, and renders a stacked bar chart of
head counts per unit together with the filtered rows as a table.

## Architecture

### Pipeline
- **Loader** - reads the CSV and drops rows missing `Lotação`, `Cargo` or `Nome`
- **Cache** - memoizes loads by path for the life of the process
- **Selection** - filter options, default selection, validation of the unit limit
- **Dashboard** - filters, groups by (unit, title) and decides the render state

### Presentation (feature `web`)
- **Graph** - stacked bar chart rendered to SVG or PNG with plotters
- **Page** - handlebars page with sidebar, messages, chart and table
- **App** - axum routes for the page, the chart images and a JSON API

## Render states

| State | Condition |
|---|---|
| `TooManyUnits` | more than five units selected |
| `NoUnitsSelected` | no unit selected |
| `NoMatchingData` | valid selection, nothing matches |
| `Rendered` | chart and table |

## HTTP Endpoints

- `/` - Dashboard page; sidebar state travels in the query string
- `/chart.svg`, `/chart.png` - Chart for the same query
- `/api/options` - Filter options and the default selection
- `/api/dashboard` - Render state as JSON
*/

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod record;
pub mod selection;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod page;

/// Re-export the pipeline types to make them easier to use
pub use cache::*;
pub use dashboard::*;
pub use error::*;
pub use record::*;
pub use selection::*;
