use axum::{extract::State, Json};
use tracing::info;

use super::{
    dto::{
        BarDto, FetchDataRequest, FetchDataResponse, PredictionsRequest, PredictionsResponse,
        TrainModelRequest, TrainModelResponse,
    },
    error::ApiError,
    state::AppState,
};
use crate::pipeline;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn train_model(
    State(state): State<AppState>,
    Json(request): Json<TrainModelRequest>,
) -> Result<Json<TrainModelResponse>, ApiError> {
    let job = request.range()?;
    info!(ticker = %job.ticker, start = %job.start, end = %job.end, "training requested");

    let summary = pipeline::run(&state.config, state.market_data.as_ref(), job).await?;
    info!(
        ticker = %summary.ticker,
        weights = %summary.weights_path.display(),
        final_reward = summary.training.final_reward,
        "training request complete"
    );

    Ok(Json(summary.into()))
}

pub async fn fetch_data(
    State(state): State<AppState>,
    Json(request): Json<FetchDataRequest>,
) -> Result<Json<FetchDataResponse>, ApiError> {
    let range = request.range()?;
    let bars = pipeline::fetch(state.market_data.as_ref(), &range).await?;

    Ok(Json(FetchDataResponse {
        data: bars.iter().map(BarDto::from).collect(),
    }))
}

pub async fn get_predictions(
    State(state): State<AppState>,
    Json(request): Json<PredictionsRequest>,
) -> Result<Json<PredictionsResponse>, ApiError> {
    let range = request.range(pipeline::today())?;
    info!(ticker = %range.ticker, start = %range.start, end = %range.end, "predictions requested");

    let predictions = pipeline::predict(&state.config, state.market_data.as_ref(), range).await?;
    Ok(Json(PredictionsResponse { predictions }))
}
