#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::cache::DatasetCache;
use crate::config::DashboardConfig;
use crate::dashboard::{self, RenderState};
use crate::error::LoadError;
use crate::graph::{self, ChartEncoding, ChartOptions};
use crate::page::PageModel;
use crate::record::Dataset;
use crate::selection::{FilterOptions, Selection};

pub struct AppState {
    pub config: DashboardConfig,
    pub cache: Arc<DatasetCache>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: Arc::new(DatasetCache::new()),
        }
    }

    /// Loads the dataset through the cache on the blocking thread pool
    ///
    /// The cache parses under its write lock so a path is read once; running it
    /// here keeps that wait off the async workers.
    async fn dataset(&self) -> Result<Arc<Dataset>, LoadError> {
        let cache = Arc::clone(&self.cache);
        let path = self.config.data_path.clone();
        tokio::task::spawn_blocking(move || cache.load(path))
            .await
            .map_err(|e| LoadError::Io(io::Error::other(e)))?
    }
}

/// Sidebar state carried in the query string
///
/// `submitted` marks a form submission: without it, and without any picked
/// value, the page falls back to the default selection.
#[derive(Deserialize, Debug, Default)]
pub struct DashboardQuery {
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub submitted: Option<String>,
}

impl DashboardQuery {
    pub fn selection(&self, options: &FilterOptions, config: &DashboardConfig) -> Selection {
        let explicit =
            self.submitted.is_some() || !self.units.is_empty() || !self.titles.is_empty();
        if explicit {
            Selection::new(self.units.iter().cloned(), self.titles.iter().cloned())
        } else {
            Selection::default_for(options, &config.default_unit)
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub options: FilterOptions,
    pub default_selection: Selection,
}

struct Evaluation {
    options: FilterOptions,
    selection: Selection,
    state: RenderState,
}

async fn evaluate(state: &AppState, query: &DashboardQuery) -> Result<Evaluation, LoadError> {
    let dataset = state.dataset().await?;
    let options = FilterOptions::from_dataset(&dataset);
    let selection = query.selection(&options, &state.config);
    let render_state = dashboard::render(&dataset, &selection, state.config.max_units);

    Ok(Evaluation {
        options,
        selection,
        state: render_state,
    })
}

fn json_error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message,
        }),
    )
        .into_response()
}

fn load_error_status(err: &LoadError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/chart.svg", get(chart_svg))
        .route("/chart.png", get(chart_png))
        .route("/api/options", get(get_options))
        .route("/api/dashboard", get(get_dashboard))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let app_state = Arc::new(AppState::new(config));

    // Warm the cache so a missing file is reported at startup
    if let Err(e) = app_state.dataset().await {
        error!("{}", e);
    }

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let page = match evaluate(&state, &query).await {
        Ok(eval) => PageModel::build(&state.config, &eval.options, &eval.selection, &eval.state),
        Err(e) if e.is_not_found() => PageModel::load_failure(&state.config, &e),
        Err(e) => {
            error!("Failed to load dataset: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn chart_encoding(
    state: &AppState,
    query: &DashboardQuery,
) -> Result<ChartEncoding, Response> {
    let eval = evaluate(state, query)
        .await
        .map_err(|e| json_error(load_error_status(&e), e.to_string()))?;

    match eval.state.view() {
        Some(view) => Ok(ChartEncoding::from_view(view)),
        None => Err(json_error(
            StatusCode::NOT_FOUND,
            "Nenhum gráfico para os filtros selecionados".to_string(),
        )),
    }
}

pub async fn chart_svg(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let encoding = match chart_encoding(&state, &query).await {
        Ok(encoding) => encoding,
        Err(response) => return response,
    };

    match graph::render_svg(&encoding, &ChartOptions::default()) {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => {
            error!("Failed to draw chart: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn chart_png(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let encoding = match chart_encoding(&state, &query).await {
        Ok(encoding) => encoding,
        Err(response) => return response,
    };

    match graph::render_png(&encoding, &ChartOptions::default()) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            error!("Failed to draw chart: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn get_options(State(state): State<Arc<AppState>>) -> Response {
    match state.dataset().await {
        Ok(dataset) => {
            let options = FilterOptions::from_dataset(&dataset);
            let default_selection = Selection::default_for(&options, &state.config.default_unit);
            Json(OptionsResponse {
                options,
                default_selection,
            })
            .into_response()
        }
        Err(e) => json_error(load_error_status(&e), e.to_string()),
    }
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    match evaluate(&state, &query).await {
        Ok(eval) => Json(eval.state).into_response(),
        Err(e) => json_error(load_error_status(&e), e.to_string()),
    }
}
