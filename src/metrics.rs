use lazy_static::lazy_static;
use prometheus::{
    CounterVec, GaugeVec, Histogram, register_counter_vec, register_gauge_vec, register_histogram,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "dork_requests_total",
        "Total number of requests",
        &["endpoint"]
    )
    .unwrap();
    pub static ref RATE_LIMITED_TOTAL: CounterVec = register_counter_vec!(
        "dork_rate_limited_total",
        "Requests rejected by the rate limiter",
        &["endpoint"]
    )
    .unwrap();
    pub static ref GENERATIONS: CounterVec = register_counter_vec!(
        "dork_generations_total",
        "Generation attempts by outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref MODEL_LATENCY: Histogram = register_histogram!(
        "dork_model_latency_seconds",
        "Model call latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_BUCKETS: GaugeVec = register_gauge_vec!(
        "dork_rate_limit_buckets",
        "Client keys currently tracked by each rate limiter",
        &["purpose"]
    )
    .unwrap();
}
