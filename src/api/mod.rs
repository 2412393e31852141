use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::FarmcastError;
use crate::advisory::{AdvisorySet, ClassifiedAdvisory};
use crate::models::{City, ForecastInterval, SearchRecord};
use crate::service::AdvisoryService;

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdvisoryService>,
}

impl AppState {
    pub fn new(service: Arc<AdvisoryService>) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub success: bool,
    pub city: City,
    pub advisory: AdvisorySet,
    pub advisory_details: Vec<ClassifiedAdvisory>,
    pub forecast: Vec<ForecastInterval>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<SearchRecord>,
}

#[derive(Debug, Serialize)]
struct Acknowledgement {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weather", post(advise))
        .route("/weather/history", get(history).delete(clear_history))
}

async fn advise(
    State(state): State<AppState>,
    payload: Result<Json<WeatherRequest>, JsonRejection>,
) -> Result<Json<WeatherResponse>, FarmcastError> {
    let Json(request) = payload.map_err(|rejection| {
        FarmcastError::validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let report = state.service.advise(&request.location).await?;
    let advisory_details = report.advisory.classified();

    Ok(Json(WeatherResponse {
        success: true,
        city: report.city,
        advisory: report.advisory,
        advisory_details,
        forecast: report.forecast,
    }))
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, FarmcastError> {
    let history = state.service.recent_searches(query.limit).await?;
    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

async fn clear_history(State(state): State<AppState>) -> Result<impl IntoResponse, FarmcastError> {
    state.service.clear_history().await?;
    Ok(Json(Acknowledgement { success: true }))
}

fn status_for(err: &FarmcastError) -> StatusCode {
    match err {
        FarmcastError::Validation { .. } => StatusCode::BAD_REQUEST,
        FarmcastError::LocationNotFound { .. } => StatusCode::NOT_FOUND,
        FarmcastError::Provider { .. } => StatusCode::BAD_GATEWAY,
        FarmcastError::Config { .. } | FarmcastError::Storage { .. } | FarmcastError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for FarmcastError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(%status, "Request failed: {self}");
        } else {
            tracing::debug!(%status, "Request rejected: {self}");
        }

        let body = ErrorBody {
            success: false,
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
