use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;
use std::time::Instant;
use crate::client_key::ClientKey;
use crate::error::AppError;
use crate::metrics::{GENERATIONS, MODEL_LATENCY, REQUEST_TOTAL};
use crate::model::ModelError;
use crate::models::{GenerateRequest, GenerateResponse};
use crate::sanitize::sanitize;
use crate::state::AppState;
use super::enforce_rate_limit;

const SYSTEM_PROMPT: &str = "You generate a single Google Dork query based on the user's intent. \
    Output only the final query with no explanation, no markdown, no quotes, and no newlines. \
    Prefer safe and legitimate operators (site:, filetype:, inurl:, intitle:, cache:, etc.). \
    Keep it concise and high-signal.";

// "Intent: ..." plus the caller's current form state when there is any
pub fn build_user_prompt(req: &GenerateRequest) -> String {
    let mut pieces = vec![format!("Intent: {}", req.prompt.trim())];
    if let Some(current) = req.current.as_ref().filter(|c| !c.is_empty()) {
        let context = serde_json::Value::Object(current.clone());
        pieces.push(format!("Context: {}", context));
    }
    pieces.join("\n")
}

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    ClientKey(client): ClientKey,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    REQUEST_TOTAL.with_label_values(&["generate"]).inc();
    let Json(payload) = payload?;

    enforce_rate_limit(&state.generate_limiter, &client, "generate")?;

    if payload.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("Missing prompt"));
    }

    let user = build_user_prompt(&payload);
    let start_time = Instant::now();
    let result = state.generator.generate_text(SYSTEM_PROMPT, &user).await;
    MODEL_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let raw = result.map_err(|e| {
        GENERATIONS.with_label_values(&["failed"]).inc();
        match e {
            ModelError::MissingCredential => {
                tracing::error!("ANTHROPIC_API_KEY is not configured");
                AppError::MissingConfiguration("ANTHROPIC_API_KEY")
            }
            other => {
                tracing::warn!(client = %client, "Model call failed: {}", other);
                AppError::ExternalService
            }
        }
    })?;

    let query = sanitize(&raw);
    if query.is_empty() {
        GENERATIONS.with_label_values(&["empty"]).inc();
        tracing::warn!(client = %client, "Model output was empty after sanitizing");
        return Err(AppError::EmptyResult);
    }

    state.store.run(|s| s.increment_queries()).await?;
    GENERATIONS.with_label_values(&["ok"]).inc();
    tracing::info!(client = %client, "Generated query");

    Ok(Json(GenerateResponse { query }))
}
