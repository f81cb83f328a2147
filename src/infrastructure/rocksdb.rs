use crate::domain::ports::{BalanceStore, CaseStore, IdempotencyStore};
use crate::domain::records::{BalanceRecord, Case, IdempotencyRecord};
use crate::error::{DecisionError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for customer balances.
pub const CF_BALANCES: &str = "balances";
/// Column Family for idempotency records.
pub const CF_IDEMPOTENCY: &str = "idempotency";
/// Column Family for review cases.
pub const CF_CASES: &str = "cases";

/// A persistent store implementation using RocksDB.
///
/// Balances, idempotency records and cases each live in their own Column Family,
/// encoded as JSON. RocksDB has no insert-if-absent primitive, so unique inserts
/// check and write while holding `insert_lock`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    insert_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// required column families if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_BALANCES, CF_IDEMPOTENCY, CF_CASES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            insert_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DecisionError::Storage(format!("column family '{name}' not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    async fn insert_unique<T: Serialize>(
        &self,
        cf_name: &str,
        key: &[u8],
        value: &T,
        label: String,
    ) -> Result<()> {
        let _guard = self.insert_lock.lock().await;
        let cf = self.cf(cf_name)?;
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(DecisionError::DuplicateKey(label));
        }
        self.write(cf_name, key, value)
    }
}

fn idempotency_key(idempotency_key: &str, customer_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(idempotency_key.len() + customer_id.len() + 1);
    key.extend_from_slice(idempotency_key.as_bytes());
    key.push(0);
    key.extend_from_slice(customer_id.as_bytes());
    key
}

#[async_trait]
impl BalanceStore for RocksDBStore {
    async fn get(&self, customer_id: &str) -> Result<Option<BalanceRecord>> {
        self.read(CF_BALANCES, customer_id.as_bytes())
    }

    async fn insert(&self, record: BalanceRecord) -> Result<()> {
        let label = record.customer_id.clone();
        self.insert_unique(CF_BALANCES, record.customer_id.as_bytes(), &record, label)
            .await
    }

    async fn upsert(&self, record: BalanceRecord) -> Result<()> {
        self.write(CF_BALANCES, record.customer_id.as_bytes(), &record)
    }
}

#[async_trait]
impl IdempotencyStore for RocksDBStore {
    async fn get(
        &self,
        idempotency_key_value: &str,
        customer_id: &str,
    ) -> Result<Option<IdempotencyRecord>> {
        self.read(
            CF_IDEMPOTENCY,
            &idempotency_key(idempotency_key_value, customer_id),
        )
    }

    async fn insert(&self, record: IdempotencyRecord) -> Result<()> {
        let key = idempotency_key(&record.idempotency_key, &record.customer_id);
        let label = format!("{}/{}", record.idempotency_key, record.customer_id);
        self.insert_unique(CF_IDEMPOTENCY, &key, &record, label)
            .await
    }
}

#[async_trait]
impl CaseStore for RocksDBStore {
    async fn insert(&self, case: Case) -> Result<()> {
        let label = case.id.clone();
        self.insert_unique(CF_CASES, case.id.as_bytes(), &case, label)
            .await
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>> {
        self.read(CF_CASES, case_id.as_bytes())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Case>> {
        let cf = self.cf(CF_CASES)?;
        let mut cases = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let case: Case = serde_json::from_slice(&value)?;
            if case.customer_id == customer_id {
                cases.push(case);
            }
        }
        cases.sort_by_key(|c| c.created_at);
        Ok(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use crate::domain::payment::{Decision, DecisionResponse, Reason};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_BALANCES).is_some());
        assert!(store.db.cf_handle(CF_IDEMPOTENCY).is_some());
        assert!(store.db.cf_handle(CF_CASES).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_balance_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let record = BalanceRecord::new("c1", Balance::new(dec!(300.0)));
        BalanceStore::insert(&store, record.clone()).await.unwrap();

        let duplicate = BalanceStore::insert(&store, record.clone()).await;
        assert!(matches!(duplicate, Err(DecisionError::DuplicateKey(_))));

        let mut updated = record.clone();
        updated.amount = Balance::new(dec!(50.0));
        BalanceStore::upsert(&store, updated.clone()).await.unwrap();

        let retrieved = BalanceStore::get(&store, "c1").await.unwrap().unwrap();
        assert_eq!(retrieved, updated);
        assert!(BalanceStore::get(&store, "c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_idempotency_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let record = IdempotencyRecord {
            idempotency_key: "k1".to_string(),
            customer_id: "c1".to_string(),
            request_hash: "h1".to_string(),
            response: DecisionResponse {
                decision: Decision::Review,
                reasons: vec![Reason::RecentDisputes],
                agent_trace: vec![],
                request_id: "req_00000001".to_string(),
            },
            created_at: Utc::now(),
        };
        IdempotencyStore::insert(&store, record.clone()).await.unwrap();

        let retrieved = IdempotencyStore::get(&store, "k1", "c1").await.unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert!(IdempotencyStore::get(&store, "k1", "c2").await.unwrap().is_none());

        let duplicate = IdempotencyStore::insert(&store, record).await;
        assert!(matches!(duplicate, Err(DecisionError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_rocksdb_case_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let case = Case::open("c1", "vendor", vec![Reason::AmountAboveDailyThreshold]);
        CaseStore::insert(&store, case.clone()).await.unwrap();
        CaseStore::insert(&store, Case::open("c2", "vendor", vec![Reason::RiskSignals]))
            .await
            .unwrap();

        assert_eq!(CaseStore::get(&store, &case.id).await.unwrap(), Some(case.clone()));
        assert_eq!(store.list_for_customer("c1").await.unwrap(), vec![case]);
    }
}
