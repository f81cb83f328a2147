use crate::domain::payment::Decision;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of most recent latency samples kept for the percentile.
pub const LATENCY_WINDOW: usize = 200;

/// Decision counters and a sliding window of request latencies.
///
/// Counters are lock-free; the latency window sits behind a lock and holds at
/// most [`LATENCY_WINDOW`] samples in milliseconds.
#[derive(Debug, Default)]
pub struct DecisionMetrics {
    total_requests: AtomicU64,
    allow: AtomicU64,
    review: AtomicU64,
    block: AtomicU64,
    latencies_ms: RwLock<VecDeque<f64>>,
}

/// Point-in-time copy of [`DecisionMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub decision_allow: u64,
    pub decision_review: u64,
    pub decision_block: u64,
    pub p95_latency_ms: f64,
    pub sample_size: usize,
}

impl DecisionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one answered request, cached replays included.
    pub fn record(&self, decision: Decision, latency: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match decision {
            Decision::Allow => &self.allow,
            Decision::Review => &self.review,
            Decision::Block => &self.block,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut window) = self.latencies_ms.write() {
            window.push_back(latency.as_secs_f64() * 1000.0);
            if window.len() > LATENCY_WINDOW {
                window.pop_front();
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples: Vec<f64> = self
            .latencies_ms
            .read()
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            decision_allow: self.allow.load(Ordering::Relaxed),
            decision_review: self.review.load(Ordering::Relaxed),
            decision_block: self.block.load(Ordering::Relaxed),
            p95_latency_ms: p95(&samples),
            sample_size: samples.len(),
        }
    }
}

/// Nearest-rank-below 95th percentile, rounded to two decimals. Empty → 0.
pub fn p95(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = (0.95 * (sorted.len() - 1) as f64) as usize;
    (sorted[idx] * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_decision() {
        let metrics = DecisionMetrics::new();
        metrics.record(Decision::Allow, Duration::from_millis(3));
        metrics.record(Decision::Allow, Duration::from_millis(4));
        metrics.record(Decision::Review, Duration::from_millis(5));
        metrics.record(Decision::Block, Duration::from_millis(6));

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.decision_allow, 2);
        assert_eq!(snap.decision_review, 1);
        assert_eq!(snap.decision_block, 1);
        assert_eq!(snap.sample_size, 4);
    }

    #[test]
    fn test_window_keeps_latest_samples() {
        let metrics = DecisionMetrics::new();
        for ms in 0..250u64 {
            metrics.record(Decision::Allow, Duration::from_millis(ms));
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 250);
        assert_eq!(snap.sample_size, LATENCY_WINDOW);

        // Window holds 50..=249; index int(0.95 * 199) = 189 → 239ms.
        assert_eq!(snap.p95_latency_ms, 239.0);
    }

    #[test]
    fn test_p95_index_and_rounding() {
        assert_eq!(p95(&[]), 0.0);
        assert_eq!(p95(&[7.126]), 7.13);
        // int(0.95 * 9) = 8, unsorted input.
        let samples = [10.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 5.0];
        assert_eq!(p95(&samples), 9.0);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = DecisionMetrics::new().snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.p95_latency_ms, 0.0);
        assert_eq!(snap.sample_size, 0);
    }
}
