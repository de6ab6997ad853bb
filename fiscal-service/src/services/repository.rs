//! Persistence seams.
//!
//! Every entity is stored through [`Repository`]; entity-specific lookups live
//! in the narrower traits below. [`MongoRepository`](super::database::MongoRepository)
//! backs production, [`InMemoryRepository`] backs tests and database-less runs.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

use super::error::ServiceError;
use crate::models::{Bill, Invoice, RateTable, TaxSummary};

/// A document persisted under a string `_id`.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + Unpin + 'static {
    const NAME: &'static str;

    fn id(&self) -> &str;

    /// Secondary key guarded by a unique index, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

impl Entity for Invoice {
    const NAME: &'static str = "Invoice";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Bill {
    const NAME: &'static str = "Bill";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for RateTable {
    const NAME: &'static str = "Rate table";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.jurisdiction_code.clone())
    }
}

impl Entity for TaxSummary {
    const NAME: &'static str = "Tax summary";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(period_key(&self.practitioner_id, self.month, self.year))
    }
}

fn period_key(practitioner_id: &str, month: i32, year: i32) -> String {
    format!("{}:{}:{}", practitioner_id, year, month)
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, ServiceError>;

    async fn find_all(&self) -> Result<Vec<T>, ServiceError>;

    async fn insert(&self, entity: &T) -> Result<(), ServiceError>;

    /// Whole-document replace. Returns `false` when no document has that id.
    async fn replace(&self, entity: &T) -> Result<bool, ServiceError>;

    /// Returns `false` when no document has that id.
    async fn delete(&self, id: &str) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait InvoiceRepository: Repository<Invoice> {
    async fn find_by_practitioner(&self, practitioner_id: &str)
        -> Result<Vec<Invoice>, ServiceError>;
}

#[async_trait]
pub trait BillRepository: Repository<Bill> {
    async fn find_by_practitioner(&self, practitioner_id: &str) -> Result<Vec<Bill>, ServiceError>;
}

#[async_trait]
pub trait RateTableRepository: Repository<RateTable> {
    async fn find_by_code(&self, code: &str) -> Result<Option<RateTable>, ServiceError>;
}

#[async_trait]
pub trait TaxSummaryRepository: Repository<TaxSummary> {
    async fn find_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<TaxSummary>, ServiceError>;

    async fn find_by_period(
        &self,
        practitioner_id: &str,
        month: i32,
        year: i32,
    ) -> Result<Option<TaxSummary>, ServiceError>;

    /// Atomically inserts or overwrites the summary of its period.
    ///
    /// An existing record keeps its id; the stored document is returned.
    async fn upsert_by_period(&self, summary: &TaxSummary) -> Result<TaxSummary, ServiceError>;
}

/// Insertion-ordered store enforcing the same uniqueness as the MongoDB indexes.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    items: Arc<RwLock<Vec<T>>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Vec<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn filtered(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.snapshot().into_iter().filter(|e| predicate(e)).collect()
    }

    fn key_taken(items: &[T], entity: &T) -> bool {
        match entity.unique_key() {
            Some(key) => items
                .iter()
                .any(|e| e.id() != entity.id() && e.unique_key().as_deref() == Some(key.as_str())),
            None => false,
        }
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_key<T: Entity>() -> ServiceError {
    ServiceError::Conflict(format!("{} with the same unique key already exists", T::NAME))
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.snapshot().into_iter().find(|e| e.id() == id))
    }

    async fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.snapshot())
    }

    async fn insert(&self, entity: &T) -> Result<(), ServiceError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.iter().any(|e| e.id() == entity.id()) || Self::key_taken(&items, entity) {
            return Err(duplicate_key::<T>());
        }
        items.push(entity.clone());
        Ok(())
    }

    async fn replace(&self, entity: &T) -> Result<bool, ServiceError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if Self::key_taken(&items, entity) {
            return Err(duplicate_key::<T>());
        }
        match items.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|e| e.id() != id);
        Ok(items.len() != before)
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryRepository<Invoice> {
    async fn find_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<Invoice>, ServiceError> {
        Ok(self.filtered(|i| i.practitioner_id() == Some(practitioner_id)))
    }
}

#[async_trait]
impl BillRepository for InMemoryRepository<Bill> {
    async fn find_by_practitioner(&self, practitioner_id: &str) -> Result<Vec<Bill>, ServiceError> {
        Ok(self.filtered(|b| b.practitioner_id == practitioner_id))
    }
}

#[async_trait]
impl RateTableRepository for InMemoryRepository<RateTable> {
    async fn find_by_code(&self, code: &str) -> Result<Option<RateTable>, ServiceError> {
        Ok(self
            .snapshot()
            .into_iter()
            .find(|r| r.jurisdiction_code == code))
    }
}

#[async_trait]
impl TaxSummaryRepository for InMemoryRepository<TaxSummary> {
    async fn find_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<TaxSummary>, ServiceError> {
        Ok(self.filtered(|s| s.practitioner_id == practitioner_id))
    }

    async fn find_by_period(
        &self,
        practitioner_id: &str,
        month: i32,
        year: i32,
    ) -> Result<Option<TaxSummary>, ServiceError> {
        Ok(self.snapshot().into_iter().find(|s| {
            s.practitioner_id == practitioner_id && s.month == month && s.year == year
        }))
    }

    async fn upsert_by_period(&self, summary: &TaxSummary) -> Result<TaxSummary, ServiceError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let key = summary.unique_key();
        match items.iter_mut().find(|s| s.unique_key() == key) {
            Some(existing) => {
                let mut stored = summary.clone();
                stored.id = existing.id.clone();
                *existing = stored.clone();
                Ok(stored)
            }
            None => {
                items.push(summary.clone());
                Ok(summary.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn summary(id: &str, month: i32) -> TaxSummary {
        TaxSummary {
            id: id.to_string(),
            practitioner_id: "p-1".to_string(),
            month,
            year: 2024,
            gross_revenue: dec!(1000),
            iss_total: dec!(50),
            irpj_total: Decimal::ZERO,
            csll_total: Decimal::ZERO,
            pis_total: Decimal::ZERO,
            cofins_total: Decimal::ZERO,
            inss_total: Decimal::ZERO,
            total_taxes: dec!(50),
            net_revenue: dec!(950),
            invoice_count: 1,
            calculated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_period() {
        let repo = InMemoryRepository::<TaxSummary>::new();
        repo.insert(&summary("a", 3)).await.unwrap();

        let err = repo.insert(&summary("b", 3)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        repo.insert(&summary("c", 4)).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn upsert_keeps_existing_id() {
        let repo = InMemoryRepository::<TaxSummary>::new();
        let first = repo.upsert_by_period(&summary("a", 3)).await.unwrap();
        assert_eq!(first.id, "a");

        let mut again = summary("b", 3);
        again.gross_revenue = dec!(2000);
        let second = repo.upsert_by_period(&again).await.unwrap();

        assert_eq!(second.id, "a");
        assert_eq!(second.gross_revenue, dec!(2000));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_and_delete_report_missing_ids() {
        let repo = InMemoryRepository::<TaxSummary>::new();
        assert!(!repo.replace(&summary("missing", 1)).await.unwrap());
        assert!(!repo.delete("missing").await.unwrap());

        repo.insert(&summary("a", 1)).await.unwrap();
        assert!(repo.delete("a").await.unwrap());
        assert!(repo.find_by_id("a").await.unwrap().is_none());
    }
}
