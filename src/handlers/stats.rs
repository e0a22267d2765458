use axum::{Json, extract::State};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::REQUEST_TOTAL;
use crate::state::AppState;
use crate::store::Stats;

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, AppError> {
    REQUEST_TOTAL.with_label_values(&["stats"]).inc();
    let stats = state.store.run(|s| s.read_stats()).await?;
    Ok(Json(stats))
}
