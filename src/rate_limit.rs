// Sliding window log rate limiting.
// Every admitted request leaves its timestamp in a per-key bucket. A key is
// over its limit while the bucket holds `max_requests` timestamps younger
// than the window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::metrics::TRACKED_BUCKETS;

// Source of "now" for the limiter, swapped out in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    // Whole seconds until the oldest entry leaves the window, 0 when allowed.
    pub retry_after: u64,
}

impl Admission {
    fn allow() -> Self {
        Self { allowed: true, retry_after: 0 }
    }
}

// Limits applied by one limiter instance.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub purpose: &'static str,
    pub max_requests: usize,
    pub window: Duration,
}

pub struct RateLimiter {
    policy: Policy,
    buckets: Mutex<HashMap<String, VecDeque<Instant>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(policy: Policy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: Policy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    // Check a client against this limiter's own policy
    pub fn check(&self, client_key: &str) -> Admission {
        let key = format!("{}:{}", self.policy.purpose, client_key);
        self.admit(&key, self.policy.max_requests, self.policy.window)
    }

    // Record a request for `key` if fewer than `max_requests` were admitted
    // within the trailing `window`.
    pub fn admit(&self, key: &str, max_requests: usize, window: Duration) -> Admission {
        let mut buckets = self.lock();
        // Read the clock under the lock so pushes stay in time order
        let now = self.clock.now();

        let bucket = buckets.entry(key.to_string()).or_default();
        purge(bucket, now, window);

        if bucket.len() >= max_requests {
            let retry_after = match bucket.front() {
                Some(oldest) => ceil_secs(window.saturating_sub(now.saturating_duration_since(*oldest))),
                // max_requests == 0, nothing will ever leave the bucket
                None => ceil_secs(window),
            };
            return Admission { allowed: false, retry_after };
        }

        bucket.push_back(now);
        TRACKED_BUCKETS
            .with_label_values(&[self.policy.purpose])
            .set(buckets.len() as f64);
        Admission::allow()
    }

    // Drop buckets with no timestamps left inside the window.
    pub fn sweep(&self) -> usize {
        let window = self.policy.window;
        let mut buckets = self.lock();
        let now = self.clock.now();

        let before = buckets.len();
        buckets.retain(|_, bucket| {
            purge(bucket, now, window);
            !bucket.is_empty()
        });
        TRACKED_BUCKETS
            .with_label_values(&[self.policy.purpose])
            .set(buckets.len() as f64);
        before - buckets.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    // Poisoning can't leave a bucket half-updated, keep serving
    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// Timestamps are pushed in order, so expired ones are always at the front
fn purge(bucket: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = bucket.front() {
        if now.saturating_duration_since(oldest) > window {
            bucket.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

// Periodic sweep so idle clients don't pile up forever
pub async fn sweeper(limiters: Vec<Arc<RateLimiter>>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!("Rate limit sweeper started (interval: {:?})", sweep_interval);

    loop {
        interval.tick().await;

        for limiter in &limiters {
            let dropped = limiter.sweep();
            if dropped > 0 {
                tracing::debug!(
                    purpose = limiter.policy().purpose,
                    dropped,
                    remaining = limiter.tracked_keys(),
                    "Dropped idle rate limit buckets"
                );
            }
        }
    }
}
