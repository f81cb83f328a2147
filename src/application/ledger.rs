use crate::domain::money::{Amount, Balance};
use crate::domain::ports::BalanceStoreBox;
use crate::domain::records::BalanceRecord;
use crate::error::{DecisionError, Result};
use crate::telemetry::mask_customer;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Customer balances with lock-protected conditional debits.
///
/// Each customer gets its own async mutex, created on first use and kept for the
/// lifetime of the ledger. Reservations for different customers never share a
/// lock.
pub struct BalanceLedger {
    store: BalanceStoreBox,
    starting_balance: Balance,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl BalanceLedger {
    pub fn new(store: BalanceStoreBox, starting_balance: Balance) -> Self {
        Self {
            store,
            starting_balance,
            locks: DashMap::new(),
        }
    }

    /// Returns the customer's balance, creating it with the starting amount on
    /// first reference.
    pub async fn get_or_create(&self, customer_id: &str) -> Result<BalanceRecord> {
        if let Some(record) = self.store.get(customer_id).await? {
            return Ok(record);
        }

        let record = BalanceRecord::new(customer_id, self.starting_balance);
        match self.store.insert(record.clone()).await {
            Ok(()) => {
                debug!(customer = %mask_customer(customer_id), "balance created");
                Ok(record)
            }
            // Another task created it first; use theirs.
            Err(DecisionError::DuplicateKey(_)) => self
                .store
                .get(customer_id)
                .await?
                .ok_or_else(|| DecisionError::Storage(format!("balance for {customer_id} vanished"))),
            Err(e) => Err(e),
        }
    }

    /// Debits `amount` if the current balance covers it.
    ///
    /// The balance is re-read under the customer's lock; whatever the caller saw
    /// earlier is only advisory. On `InsufficientFunds` nothing is written.
    pub async fn reserve(&self, customer_id: &str, amount: Amount) -> Result<Balance> {
        let lock = self.lock_for(customer_id);
        let _guard = lock.lock().await;

        let mut record = self.get_or_create(customer_id).await?;
        if !record.amount.covers(amount) {
            return Err(DecisionError::InsufficientFunds {
                available: record.amount.value(),
                requested: amount.value(),
            });
        }

        record.amount -= amount;
        record.updated_at = Utc::now();
        let remaining = record.amount;
        self.store.upsert(record).await?;

        info!(
            customer = %mask_customer(customer_id),
            %amount,
            %remaining,
            "funds reserved"
        );
        Ok(remaining)
    }

    fn lock_for(&self, customer_id: &str) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map shard is released before awaiting.
        self.locks
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryBalanceStore;
    use rust_decimal_macros::dec;

    fn ledger(starting: rust_decimal::Decimal) -> BalanceLedger {
        BalanceLedger::new(Box::new(InMemoryBalanceStore::new()), Balance::new(starting))
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let ledger = ledger(dec!(300));
        let first = ledger.get_or_create("c1").await.unwrap();
        assert_eq!(first.amount, Balance::new(dec!(300)));

        ledger.reserve("c1", Amount::new(dec!(100)).unwrap()).await.unwrap();
        let second = ledger.get_or_create("c1").await.unwrap();
        assert_eq!(second.amount, Balance::new(dec!(200)));
    }

    #[tokio::test]
    async fn test_reserve_insufficient_leaves_balance() {
        let ledger = ledger(dec!(50));
        let result = ledger.reserve("c1", Amount::new(dec!(100)).unwrap()).await;
        assert!(matches!(result, Err(DecisionError::InsufficientFunds { .. })));

        let record = ledger.get_or_create("c1").await.unwrap();
        assert_eq!(record.amount, Balance::new(dec!(50)));
    }

    #[tokio::test]
    async fn test_reserve_to_exactly_zero() {
        let ledger = ledger(dec!(100));
        let remaining = ledger.reserve("c1", Amount::new(dec!(100)).unwrap()).await.unwrap();
        assert_eq!(remaining, Balance::ZERO);
        assert!(ledger.reserve("c1", Amount::new(dec!(0.01)).unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_locks_are_reused_per_customer() {
        let ledger = ledger(dec!(100));
        let a = ledger.lock_for("c1");
        let b = ledger.lock_for("c1");
        let c = ledger.lock_for("c2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
