//! Application layer: admission control, idempotent replay, balance
//! reservation, decision metrics and the tool orchestrator, composed by
//! `DecisionPipeline`.
//!
//! Shared state (rate buckets, ledger locks) is keyed per customer so requests
//! for different customers never contend with each other.

pub mod agent;
pub mod idempotency;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod rate_limiter;
