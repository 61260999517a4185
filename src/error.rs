use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the personnel CSV
#[derive(Error, Debug)]
pub enum LoadError {
    /// The data file does not exist. This is the only load failure the page
    /// recovers from with a fixed message.
    #[error("Erro: O arquivo '{}' não foi encontrado. Certifique-se de que ele está na mesma pasta da aplicação.", .path.display())]
    NotFound { path: PathBuf },

    /// A required column is absent from the header row
    #[error("Required column '{column}' is missing from {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// The file could not be parsed as CSV
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// A selection that cannot be rendered
///
/// Both variants map to render states rather than to failures of the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Limite excedido! Selecione até {max} lotações.")]
    TooManyUnits { selected: usize, max: usize },

    #[error("Nenhuma lotação selecionada")]
    NoUnits,
}

/// Failures while drawing or encoding a chart
#[cfg(feature = "web")]
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart drawing failed: {0}")]
    Drawing(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] image::ImageError),

    #[error("Nothing to plot")]
    Empty,
}

#[cfg(feature = "web")]
impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ChartError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(err.to_string())
    }
}
