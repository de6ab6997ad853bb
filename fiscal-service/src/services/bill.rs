use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::error::ServiceError;
use super::repository::{BillRepository, Repository};
use super::validation::{assign_id, ensure_same_id, invalid, is_valid_id, parse_id};
use crate::models::{Bill, BillStatus};

const ENTITY: &str = "Bill";

#[derive(Clone)]
pub struct BillService {
    repo: Arc<dyn BillRepository>,
}

impl BillService {
    pub fn new(repo: Arc<dyn BillRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: &str) -> Result<Bill, ServiceError> {
        let id = parse_id(id)?;
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))
    }

    pub async fn list(&self) -> Result<Vec<Bill>, ServiceError> {
        self.repo.find_all().await
    }

    pub async fn list_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<Bill>, ServiceError> {
        let practitioner_id = parse_id(practitioner_id)?;
        self.repo.find_by_practitioner(&practitioner_id).await
    }

    #[tracing::instrument(skip(self, bill))]
    pub async fn create(&self, mut bill: Bill) -> Result<Bill, ServiceError> {
        bill.id = assign_id(&bill.id)?;
        bill.issue_date = Utc::now();
        validate(&mut bill)?;

        self.repo.insert(&bill).await?;
        tracing::info!(bill_id = %bill.id, "Bill created");
        Ok(bill)
    }

    /// Replaces a bill. The stored issue date is kept.
    #[tracing::instrument(skip(self, bill))]
    pub async fn update(&self, id: &str, mut bill: Bill) -> Result<Bill, ServiceError> {
        let id = parse_id(id)?;
        ensure_same_id(&id, &bill.id)?;
        let existing = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))?;

        bill.id = id;
        bill.issue_date = existing.issue_date;
        validate(&mut bill)?;

        if !self.repo.replace(&bill).await? {
            return Err(ServiceError::not_found(ENTITY, &bill.id));
        }
        Ok(bill)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        if !self.repo.delete(&id).await? {
            return Err(ServiceError::not_found(ENTITY, &id));
        }
        Ok(())
    }

    pub async fn exists(&self, id: &str) -> Result<bool, ServiceError> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        let id = parse_id(id)?;
        Ok(self.repo.find_by_id(&id).await?.is_some())
    }

    /// Sum of the values of the invoices grouped in the bill.
    pub async fn total_value(&self, id: &str) -> Result<Decimal, ServiceError> {
        Ok(self.get(id).await?.invoices_total()?)
    }
}

fn validate(bill: &mut Bill) -> Result<(), ServiceError> {
    bill.practitioner_id = parse_id(&bill.practitioner_id)
        .map_err(|_| invalid("Practitioner ID must be a valid, non-empty UUID"))?;

    if bill.total_value < Decimal::ZERO {
        return Err(invalid("Total value cannot be negative"));
    }
    bill.invoices_total()?;

    // Compared by calendar day: the issue date is stamped by the server.
    if let Some(due) = bill.due_date {
        if due.date_naive() < bill.issue_date.date_naive() {
            return Err(invalid("Due date cannot be before the issue date"));
        }
    }

    if bill.status == BillStatus::Paid && bill.payment_date.is_none() {
        return Err(invalid("Payment date is required when the bill is paid"));
    }
    Ok(())
}
