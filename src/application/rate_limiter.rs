use crate::error::{DecisionError, Result};
use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// Token bucket state for one customer.
#[derive(Debug, Clone, Copy)]
struct RateBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-customer token-bucket admission control.
///
/// Buckets live in a sharded concurrent map. The read-modify-write of a bucket
/// happens while holding its entry guard, so checks for the same customer are
/// serialized while different customers proceed independently.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    buckets: DashMap<String, RateBucket>,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec,
            buckets: DashMap::new(),
        }
    }

    /// Admits or denies one request for `customer_id` at the current instant.
    pub fn admit(&self, customer_id: &str) -> Result<()> {
        self.admit_at(customer_id, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading.
    pub fn admit_at(&self, customer_id: &str, now: Instant) -> Result<()> {
        let mut bucket = self
            .buckets
            .entry(customer_id.to_string())
            .or_insert_with(|| RateBucket {
                tokens: self.capacity,
                last_refill: now,
            });

        // A clock reading older than the bucket's must not rewind it, or the
        // same interval would be credited twice.
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = bucket.last_refill.max(now);

        if bucket.tokens < 1.0 {
            debug!(tokens = bucket.tokens, "bucket empty");
            return Err(DecisionError::AdmissionDenied(customer_id.to_string()));
        }
        bucket.tokens -= 1.0;
        Ok(())
    }

    /// Tokens currently held by a customer's bucket, if it exists.
    pub fn tokens(&self, customer_id: &str) -> Option<f64> {
        self.buckets.get(customer_id).map(|b| b.tokens)
    }
}
