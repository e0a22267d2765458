mod health;
mod metrics;
mod generate;
mod visit;
mod stats;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use generate::generate_handler;
pub use visit::visit_handler;
pub use stats::stats_handler;

use axum::{Router, routing::{get, post}};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::RATE_LIMITED_TOTAL;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate", post(generate_handler))
        .route("/visit", post(visit_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

fn enforce_rate_limit(limiter: &RateLimiter, client: &str, endpoint: &str) -> Result<(), AppError> {
    let decision = limiter.check(client);
    if decision.allowed {
        return Ok(());
    }

    RATE_LIMITED_TOTAL.with_label_values(&[endpoint]).inc();
    tracing::debug!(client, endpoint, retry_after = decision.retry_after, "Rate limit exceeded");
    Err(AppError::RateLimited { retry_after: decision.retry_after })
}
