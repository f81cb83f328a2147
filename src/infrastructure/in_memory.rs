use crate::domain::ports::{BalanceStore, CaseStore, IdempotencyStore};
use crate::domain::records::{BalanceRecord, Case, IdempotencyRecord};
use crate::error::{DecisionError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for customer balances.
///
/// Uses `Arc<RwLock<HashMap<String, BalanceRecord>>>` to allow shared concurrent access.
/// Ideal for testing or single-run CLI sessions where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryBalanceStore {
    balances: Arc<RwLock<HashMap<String, BalanceRecord>>>,
}

impl InMemoryBalanceStore {
    /// Creates a new, empty in-memory balance store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get(&self, customer_id: &str) -> Result<Option<BalanceRecord>> {
        let balances = self.balances.read().await;
        Ok(balances.get(customer_id).cloned())
    }

    async fn insert(&self, record: BalanceRecord) -> Result<()> {
        let mut balances = self.balances.write().await;
        match balances.entry(record.customer_id.clone()) {
            Entry::Occupied(_) => Err(DecisionError::DuplicateKey(record.customer_id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn upsert(&self, record: BalanceRecord) -> Result<()> {
        let mut balances = self.balances.write().await;
        balances.insert(record.customer_id.clone(), record);
        Ok(())
    }
}

/// A thread-safe in-memory store for idempotency records, keyed by
/// `(idempotency_key, customer_id)`.
#[derive(Default, Clone)]
pub struct InMemoryIdempotencyStore {
    records: Arc<RwLock<HashMap<(String, String), IdempotencyRecord>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(
        &self,
        idempotency_key: &str,
        customer_id: &str,
    ) -> Result<Option<IdempotencyRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(idempotency_key.to_string(), customer_id.to_string()))
            .cloned())
    }

    async fn insert(&self, record: IdempotencyRecord) -> Result<()> {
        let mut records = self.records.write().await;
        let key = (record.idempotency_key.clone(), record.customer_id.clone());
        match records.entry(key) {
            Entry::Occupied(_) => Err(DecisionError::DuplicateKey(format!(
                "{}/{}",
                record.idempotency_key, record.customer_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }
}

/// A thread-safe in-memory store for review cases.
#[derive(Default, Clone)]
pub struct InMemoryCaseStore {
    cases: Arc<RwLock<HashMap<String, Case>>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn insert(&self, case: Case) -> Result<()> {
        let mut cases = self.cases.write().await;
        match cases.entry(case.id.clone()) {
            Entry::Occupied(_) => Err(DecisionError::DuplicateKey(case.id)),
            Entry::Vacant(slot) => {
                slot.insert(case);
                Ok(())
            }
        }
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>> {
        let cases = self.cases.read().await;
        Ok(cases.get(case_id).cloned())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Case>> {
        let cases = self.cases.read().await;
        let mut found: Vec<Case> = cases
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.created_at);
        Ok(found)
    }
}
