#![cfg(feature = "web")]
//! Server-side rendering of the dashboard page

use crate::config::DashboardConfig;
use crate::dashboard::{DashboardView, RenderState};
use crate::error::{LoadError, SelectionError};
use crate::graph::{self, ChartEncoding};
use crate::selection::{FilterOptions, Selection};
use handlebars::{Handlebars, RenderError};
use lazy_static::lazy_static;
use serde::Serialize;

pub const HEADING: &str = "📊 Cargos por Lotação";
pub const INTRO: &str = "Utilize os filtros ao lado para selecionar as lotações e respectivos cargos.";
pub const UNITS_LABEL: &str = "Selecione a(s) Lotação(ões) (máx. 5):";
pub const UNITS_HELP: &str = "Escolha até 5 lotações para comparar.";
pub const TITLES_LABEL: &str = "Selecione o(s) Cargo(s):";
pub const TITLES_HELP: &str =
    "Escolha um ou mais cargos. Se nenhum for selecionado, todos serão exibidos.";
pub const TOO_MANY_MAIN: &str = "Por favor, desmarque algumas lotações para continuar.";
pub const NO_UNITS_INFO: &str =
    "⬅️ Selecione ao menos uma lotação na barra lateral para visualizar os dados.";
pub const NO_DATA_WARNING: &str = "Nenhum dado encontrado para os filtros selecionados.";
pub const CHART_HEADER: &str = "Distribuição de Cargos por Lotação";
pub const TABLE_SUMMARY: &str = "Visualizar dados filtrados em tabela";

lazy_static! {
    static ref TEMPLATES: Handlebars<'static> = {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("dashboard", include_str!("./static/dashboard.hbs"))
            .expect("dashboard template must parse");
        registry
    };
}

#[derive(Serialize, Debug)]
pub struct OptionItem {
    pub value: String,
    pub selected: bool,
}

#[derive(Serialize, Debug)]
pub struct Sidebar {
    pub units: Vec<OptionItem>,
    pub titles: Vec<OptionItem>,
    pub units_label: &'static str,
    pub units_help: &'static str,
    pub titles_label: &'static str,
    pub titles_help: &'static str,
    /// Shown under the unit picker when too many units are selected
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct LegendEntry {
    pub title: String,
    pub color: String,
}

#[derive(Serialize, Debug)]
pub struct GroupEntry {
    pub unit: String,
    pub title: String,
    pub count: usize,
    pub members: String,
    pub hover: String,
}

#[derive(Serialize, Debug)]
pub struct TablePanel {
    pub summary: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Serialize, Debug)]
pub struct ChartPanel {
    pub header: &'static str,
    pub svg_url: String,
    pub png_url: String,
    pub legend: Vec<LegendEntry>,
    pub groups: Vec<GroupEntry>,
    pub table: TablePanel,
}

/// Template data for the whole page
#[derive(Serialize, Debug)]
pub struct PageModel {
    pub page_title: String,
    pub heading: &'static str,
    pub intro: &'static str,
    pub load_error: Option<String>,
    pub sidebar: Option<Sidebar>,
    pub error: Option<&'static str>,
    pub info: Option<&'static str>,
    pub warning: Option<&'static str>,
    pub chart: Option<ChartPanel>,
}

impl PageModel {
    fn empty(config: &DashboardConfig) -> Self {
        PageModel {
            page_title: config.page_title.clone(),
            heading: HEADING,
            intro: INTRO,
            load_error: None,
            sidebar: None,
            error: None,
            info: None,
            warning: None,
            chart: None,
        }
    }

    /// Page shown when the data file could not be read: message only, no filters
    pub fn load_failure(config: &DashboardConfig, err: &LoadError) -> Self {
        PageModel {
            load_error: Some(err.to_string()),
            ..Self::empty(config)
        }
    }

    /// Page for one render of the pipeline
    pub fn build(
        config: &DashboardConfig,
        options: &FilterOptions,
        selection: &Selection,
        state: &RenderState,
    ) -> Self {
        let mut page = Self::empty(config);
        let mut sidebar = Sidebar {
            units: option_items(&options.unit_options, &selection.units),
            titles: option_items(&options.title_options, &selection.titles),
            units_label: UNITS_LABEL,
            units_help: UNITS_HELP,
            titles_label: TITLES_LABEL,
            titles_help: TITLES_HELP,
            error: None,
        };

        match state {
            RenderState::TooManyUnits { selected, max } => {
                let err = SelectionError::TooManyUnits {
                    selected: *selected,
                    max: *max,
                };
                sidebar.error = Some(err.to_string());
                page.error = Some(TOO_MANY_MAIN);
            }
            RenderState::NoUnitsSelected => page.info = Some(NO_UNITS_INFO),
            RenderState::NoMatchingData => page.warning = Some(NO_DATA_WARNING),
            RenderState::Rendered(view) => page.chart = Some(chart_panel(view, selection)),
        }

        page.sidebar = Some(sidebar);
        page
    }

    pub fn render(&self) -> Result<String, RenderError> {
        TEMPLATES.render("dashboard", self)
    }
}

fn option_items(options: &[String], selected: &[String]) -> Vec<OptionItem> {
    options
        .iter()
        .map(|value| OptionItem {
            value: value.clone(),
            selected: selected.contains(value),
        })
        .collect()
}

fn chart_panel(view: &DashboardView, selection: &Selection) -> ChartPanel {
    let query = selection_query(selection);
    let encoding = ChartEncoding::from_view(view);

    ChartPanel {
        header: CHART_HEADER,
        svg_url: format!("/chart.svg?{}", query),
        png_url: format!("/chart.png?{}", query),
        legend: encoding
            .series
            .iter()
            .enumerate()
            .map(|(i, title)| LegendEntry {
                title: title.clone(),
                color: graph::series_color_hex(i),
            })
            .collect(),
        groups: view
            .aggregates
            .iter()
            .map(|row| GroupEntry {
                unit: row.unit.clone(),
                title: row.title.clone(),
                count: row.count,
                members: row.members.clone(),
                hover: graph::hover_text(row),
            })
            .collect(),
        table: TablePanel {
            summary: TABLE_SUMMARY,
            headers: view.headers.clone(),
            rows: view.rows.iter().map(|record| record.fields.clone()).collect(),
        },
    }
}

/// Query string that reproduces `selection` as a submitted form
pub fn selection_query(selection: &Selection) -> String {
    let mut parts = vec!["submitted=1".to_string()];
    parts.extend(
        selection
            .units
            .iter()
            .map(|unit| format!("units={}", urlencoding::encode(unit))),
    );
    parts.extend(
        selection
            .titles
            .iter()
            .map(|title| format!("titles={}", urlencoding::encode(title))),
    );
    parts.join("&")
}
