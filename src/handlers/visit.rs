use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;
use crate::client_key::ClientKey;
use crate::error::AppError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::VisitRequest;
use crate::state::AppState;
use crate::store::Stats;
use super::enforce_rate_limit;

pub async fn visit_handler(
    State(state): State<Arc<AppState>>,
    ClientKey(client): ClientKey,
    payload: Result<Json<VisitRequest>, JsonRejection>,
) -> Result<Json<Stats>, AppError> {
    REQUEST_TOTAL.with_label_values(&["visit"]).inc();
    let Json(payload) = payload?;

    enforce_rate_limit(&state.visit_limiter, &client, "visit")?;

    let visitor_id = payload.visitor_id.trim().to_string();
    let stats = state
        .store
        .run(move |s| {
            s.upsert_visitor(&visitor_id)?;
            s.read_stats()
        })
        .await?;

    Ok(Json(stats))
}
