use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::error::ServiceError;
use super::metrics;
use super::repository::{InvoiceRepository, RateTableRepository, Repository, TaxSummaryRepository};
use super::tax_aggregation::{aggregate, invoices_in_period, jurisdiction_codes, validate_period};
use super::validation::{assign_id, ensure_same_id, invalid, is_valid_id, new_id, parse_id};
use crate::models::TaxSummary;

const ENTITY: &str = "Tax summary";

#[derive(Clone)]
pub struct TaxSummaryService {
    repo: Arc<dyn TaxSummaryRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    rate_tables: Arc<dyn RateTableRepository>,
}

impl TaxSummaryService {
    pub fn new(
        repo: Arc<dyn TaxSummaryRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        rate_tables: Arc<dyn RateTableRepository>,
    ) -> Self {
        Self {
            repo,
            invoices,
            rate_tables,
        }
    }

    pub async fn get(&self, id: &str) -> Result<TaxSummary, ServiceError> {
        let id = parse_id(id)?;
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))
    }

    pub async fn list(&self) -> Result<Vec<TaxSummary>, ServiceError> {
        self.repo.find_all().await
    }

    pub async fn list_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<TaxSummary>, ServiceError> {
        let practitioner_id = parse_id(practitioner_id)?;
        self.repo.find_by_practitioner(&practitioner_id).await
    }

    pub async fn get_by_period(
        &self,
        practitioner_id: &str,
        month: i32,
        year: i32,
    ) -> Result<TaxSummary, ServiceError> {
        let practitioner_id = parse_id(practitioner_id)?;
        validate_period(month, year).map_err(ServiceError::InvalidArgument)?;
        self.repo
            .find_by_period(&practitioner_id, month, year)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No tax summary for practitioner {} in {:02}/{}",
                    practitioner_id, month, year
                ))
            })
    }

    #[tracing::instrument(skip(self, summary))]
    pub async fn create(&self, mut summary: TaxSummary) -> Result<TaxSummary, ServiceError> {
        validate(&mut summary)?;
        if self
            .repo
            .find_by_period(&summary.practitioner_id, summary.month, summary.year)
            .await?
            .is_some()
        {
            return Err(duplicate_period(&summary));
        }

        summary.id = assign_id(&summary.id)?;
        summary.calculated_at = Utc::now();
        summary.recompute_derived()?;
        self.repo.insert(&summary).await?;
        Ok(summary)
    }

    #[tracing::instrument(skip(self, summary))]
    pub async fn update(
        &self,
        id: &str,
        mut summary: TaxSummary,
    ) -> Result<TaxSummary, ServiceError> {
        let id = parse_id(id)?;
        ensure_same_id(&id, &summary.id)?;
        if self.repo.find_by_id(&id).await?.is_none() {
            return Err(ServiceError::not_found(ENTITY, &id));
        }

        validate(&mut summary)?;
        let clash = self
            .repo
            .find_by_period(&summary.practitioner_id, summary.month, summary.year)
            .await?;
        if clash.is_some_and(|other| other.id != id) {
            return Err(duplicate_period(&summary));
        }

        summary.id = id;
        summary.calculated_at = Utc::now();
        summary.recompute_derived()?;
        if !self.repo.replace(&summary).await? {
            return Err(ServiceError::not_found(ENTITY, &summary.id));
        }
        Ok(summary)
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

    /// Aggregates a practitioner's invoices for one month and stores the result.
    ///
    /// Recomputing a period overwrites the stored summary in place, keeping
    /// its id. A month without invoices is `NotFound`; no empty summary is
    /// written.
    #[tracing::instrument(skip(self))]
    pub async fn compute_summary(
        &self,
        practitioner_id: &str,
        month: i32,
        year: i32,
    ) -> Result<TaxSummary, ServiceError> {
        let practitioner_id = parse_id(practitioner_id)?;
        validate_period(month, year).map_err(ServiceError::InvalidArgument)?;

        let invoices = self.invoices.find_by_practitioner(&practitioner_id).await?;
        let invoices = invoices_in_period(invoices, month, year);
        if invoices.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No invoices found for practitioner {} in {:02}/{}",
                practitioner_id, month, year
            )));
        }

        let mut rate_tables = Vec::new();
        for code in jurisdiction_codes(&invoices) {
            match self.rate_tables.find_by_code(&code).await? {
                Some(rate_table) => rate_tables.push(rate_table),
                None => {
                    tracing::warn!(code = %code, "No rate table for jurisdiction, taxes count as zero")
                }
            }
        }

        let totals = aggregate(&invoices, &rate_tables)?;
        let summary = TaxSummary {
            id: new_id(),
            practitioner_id,
            month,
            year,
            gross_revenue: totals.gross_revenue,
            iss_total: totals.iss,
            irpj_total: totals.irpj,
            csll_total: totals.csll,
            pis_total: totals.pis,
            cofins_total: totals.cofins,
            inss_total: totals.inss,
            total_taxes: totals.total_taxes()?,
            net_revenue: totals.net_revenue()?,
            invoice_count: totals.invoice_count,
            calculated_at: Utc::now(),
        };

        let stored = self.repo.upsert_by_period(&summary).await?;
        metrics::record_tax_summary_computed();
        tracing::info!(
            summary_id = %stored.id,
            invoice_count = stored.invoice_count,
            "Tax summary computed"
        );
        Ok(stored)
    }
}

fn duplicate_period(summary: &TaxSummary) -> ServiceError {
    ServiceError::Conflict(format!(
        "A tax summary for practitioner {} in {:02}/{} already exists",
        summary.practitioner_id, summary.month, summary.year
    ))
}

fn validate(summary: &mut TaxSummary) -> Result<(), ServiceError> {
    summary.practitioner_id = parse_id(&summary.practitioner_id)
        .map_err(|_| invalid("Practitioner ID must be a valid, non-empty UUID"))?;
    validate_period(summary.month, summary.year).map_err(ServiceError::InvalidArgument)?;

    if summary.gross_revenue < Decimal::ZERO {
        return Err(invalid("Gross revenue cannot be negative"));
    }
    if summary.invoice_count < 0 {
        return Err(invalid("Invoice count cannot be negative"));
    }
    Ok(())
}
