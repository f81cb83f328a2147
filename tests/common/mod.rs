#![allow(dead_code)]

use async_trait::async_trait;
use paydecide::application::pipeline::DecisionPipeline;
use paydecide::config::DecisionConfig;
use paydecide::domain::money::Balance;
use paydecide::domain::payment::PaymentRequest;
use paydecide::domain::ports::{BalanceStore, BalanceStoreBox};
use paydecide::domain::records::BalanceRecord;
use paydecide::domain::risk::{RiskSignal, RiskSignalSource};
use paydecide::error::{DecisionError, Result};
use paydecide::infrastructure::in_memory::{
    InMemoryBalanceStore, InMemoryCaseStore, InMemoryIdempotencyStore,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::NamedTempFile;

pub const CSV_HEADER: &str = "customer_id, amount, currency, payee_id, idempotency_key";

/// Defaults with fast retries so failing-source tests stay quick.
pub fn test_config() -> DecisionConfig {
    DecisionConfig {
        retry_base_delay_ms: 1,
        ..Default::default()
    }
}

pub fn pipeline_with(config: &DecisionConfig) -> DecisionPipeline {
    DecisionPipeline::new(
        config,
        Box::new(InMemoryBalanceStore::new()),
        Box::new(InMemoryIdempotencyStore::new()),
        Box::new(InMemoryCaseStore::new()),
    )
}

pub fn pipeline_with_balances(balances: BalanceStoreBox) -> DecisionPipeline {
    DecisionPipeline::new(
        &test_config(),
        balances,
        Box::new(InMemoryIdempotencyStore::new()),
        Box::new(InMemoryCaseStore::new()),
    )
}

pub fn pipeline() -> DecisionPipeline {
    pipeline_with(&test_config())
}

pub fn request(customer: &str, amount: Decimal, payee: &str, key: &str) -> PaymentRequest {
    PaymentRequest::new(customer, amount, "USD", payee, key).unwrap()
}

/// A risk source that fails its first `failures` calls, then returns `signal`.
pub struct FlakyRiskSource {
    failures: u32,
    signal: RiskSignal,
    calls: Arc<AtomicU32>,
}

impl FlakyRiskSource {
    pub fn new(failures: u32, signal: RiskSignal) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                failures,
                signal,
                calls: calls.clone(),
            },
            calls,
        )
    }

    pub fn always_failing() -> (Self, Arc<AtomicU32>) {
        Self::new(u32::MAX, RiskSignal::default())
    }
}

#[async_trait]
impl RiskSignalSource for FlakyRiskSource {
    async fn signals(&self, _customer_id: &str, _payee_id: &str) -> Result<RiskSignal> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(DecisionError::SignalFailure("risk service unavailable".into()))
        } else {
            Ok(self.signal)
        }
    }
}

pub fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CSV_HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// A balance store whose first read reports `stale` while the real row holds
/// `actual`. Later reads and all writes go to the real row.
pub struct StaleBalanceStore {
    inner: InMemoryBalanceStore,
    stale: Mutex<Option<BalanceRecord>>,
}

impl StaleBalanceStore {
    pub async fn new(customer_id: &str, stale: Decimal, actual: Decimal) -> Self {
        let inner = InMemoryBalanceStore::new();
        inner
            .insert(BalanceRecord::new(customer_id, Balance::new(actual)))
            .await
            .unwrap();
        Self {
            inner,
            stale: Mutex::new(Some(BalanceRecord::new(customer_id, Balance::new(stale)))),
        }
    }
}

#[async_trait]
impl BalanceStore for StaleBalanceStore {
    async fn get(&self, customer_id: &str) -> Result<Option<BalanceRecord>> {
        let stale = self.stale.lock().unwrap().take();
        match stale {
            Some(record) => Ok(Some(record)),
            None => self.inner.get(customer_id).await,
        }
    }

    async fn insert(&self, record: BalanceRecord) -> Result<()> {
        self.inner.insert(record).await
    }

    async fn upsert(&self, record: BalanceRecord) -> Result<()> {
        self.inner.upsert(record).await
    }
}

/// A balance store that is always down.
pub struct FailingBalanceStore;

#[async_trait]
impl BalanceStore for FailingBalanceStore {
    async fn get(&self, _customer_id: &str) -> Result<Option<BalanceRecord>> {
        Err(DecisionError::Storage("balance store offline".into()))
    }

    async fn insert(&self, _record: BalanceRecord) -> Result<()> {
        Err(DecisionError::Storage("balance store offline".into()))
    }

    async fn upsert(&self, _record: BalanceRecord) -> Result<()> {
        Err(DecisionError::Storage("balance store offline".into()))
    }
}
