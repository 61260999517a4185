use std::path::PathBuf;

/// Data file read by the dashboard, relative to the working directory
pub const DATA_FILE: &str = "servidores-ativos-remuneracao-07-2025.csv";
/// Unit preselected on the first visit
pub const DEFAULT_UNIT: &str = "SERVICO TECNICO-ADMINISTRATIVO DE PIRACICABA";
/// Most units that can be compared at once
pub const MAX_UNITS: usize = 5;

/// Settings of the dashboard server
///
/// Every value is a literal; nothing is read from flags or the environment.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// CSV file with the personnel records
    pub data_path: PathBuf,

    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Upper bound on selected units
    pub max_units: usize,

    /// Unit preselected when the page is first opened
    pub default_unit: String,

    /// Browser tab title
    pub page_title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DATA_FILE),
            bind_addr: "127.0.0.1:3000".to_string(),
            max_units: MAX_UNITS,
            default_unit: DEFAULT_UNIT.to_string(),
            page_title: "Cargos por Lotação (Julho de 2025)".to_string(),
        }
    }
}
