use std::sync::Arc;
use crate::config::Args;
use crate::model::TextGenerator;
use crate::rate_limit::{Policy, RateLimiter};
use crate::store::StatsStore;
// app's shared state

pub struct AppState {
    pub store: StatsStore,
    pub generator: Arc<dyn TextGenerator>,
    pub generate_limiter: Arc<RateLimiter>,
    pub visit_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(args: &Args, store: StatsStore, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            generate_limiter: Arc::new(RateLimiter::new(Policy {
                purpose: "gen",
                max_requests: args.rate_limit,
                window: args.generate_window(),
            })),
            visit_limiter: Arc::new(RateLimiter::new(Policy {
                purpose: "visit",
                max_requests: args.visit_rate_limit,
                window: args.visit_window(),
            })),
        }
    }

    pub fn limiters(&self) -> Vec<Arc<RateLimiter>> {
        vec![self.generate_limiter.clone(), self.visit_limiter.clone()]
    }
}
