use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::error::ServiceError;
use super::metrics;
use super::notification::{InvoiceNotification, NOTIFICATION_SUBJECT};
use super::queue::{MessageQueue, QueueMessage};
use super::repository::{InvoiceRepository, Repository};
use super::validation::{assign_id, ensure_percentage, ensure_same_id, invalid, is_valid_id, parse_id};
use crate::models::Invoice;

const ENTITY: &str = "Invoice";
const MAX_NUMBER_LEN: usize = 50;
const MAX_JURISDICTION_LEN: usize = 100;

fn exceeds(value: &Option<String>, max: usize) -> bool {
    value.as_deref().is_some_and(|v| v.chars().count() > max)
}

#[derive(Clone)]
pub struct InvoiceService {
    repo: Arc<dyn InvoiceRepository>,
    queue: Arc<dyn MessageQueue>,
    notification_queue: String,
}

impl InvoiceService {
    pub fn new(
        repo: Arc<dyn InvoiceRepository>,
        queue: Arc<dyn MessageQueue>,
        notification_queue: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            queue,
            notification_queue: notification_queue.into(),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Invoice, ServiceError> {
        let id = parse_id(id)?;
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, ServiceError> {
        self.repo.find_all().await
    }

    pub async fn list_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<Invoice>, ServiceError> {
        let practitioner_id = parse_id(practitioner_id)?;
        self.repo.find_by_practitioner(&practitioner_id).await
    }

    /// Stores a new invoice and queues its integration notification.
    ///
    /// The id and issue date are assigned here. Publishing happens on a
    /// spawned task; a queue failure never fails the create.
    #[tracing::instrument(skip(self, invoice))]
    pub async fn create(&self, mut invoice: Invoice) -> Result<Invoice, ServiceError> {
        validate(&mut invoice)?;
        invoice.id = assign_id(&invoice.id)?;
        invoice.issue_date = Utc::now();

        self.repo.insert(&invoice).await?;
        metrics::record_invoice_created();
        tracing::info!(invoice_id = %invoice.id, "Invoice created");

        self.publish_created(&invoice);
        Ok(invoice)
    }

    /// Replaces an invoice. The stored issue date is kept.
    #[tracing::instrument(skip(self, invoice))]
    pub async fn update(&self, id: &str, mut invoice: Invoice) -> Result<Invoice, ServiceError> {
        let id = parse_id(id)?;
        ensure_same_id(&id, &invoice.id)?;
        let existing = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))?;

        validate(&mut invoice)?;
        invoice.id = id;
        invoice.issue_date = existing.issue_date;

        if !self.repo.replace(&invoice).await? {
            return Err(ServiceError::not_found(ENTITY, &invoice.id));
        }
        Ok(invoice)
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

    /// Sum of the derived line totals of one invoice.
    pub async fn line_total(&self, id: &str) -> Result<Decimal, ServiceError> {
        Ok(self.get(id).await?.line_total()?)
    }

    fn publish_created(&self, invoice: &Invoice) {
        let payload = InvoiceNotification::from(invoice);
        let queue = Arc::clone(&self.queue);
        let destination = self.notification_queue.clone();

        tokio::spawn(async move {
            let sent = match QueueMessage::new(NOTIFICATION_SUBJECT, &payload) {
                Ok(message) => queue.send_to_queue(&destination, &message).await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(()) => {
                    metrics::record_queue_publish(true);
                    tracing::info!(
                        invoice_id = %payload.id,
                        queue = %destination,
                        "Invoice notification published"
                    );
                }
                Err(e) => {
                    metrics::record_queue_publish(false);
                    tracing::warn!(
                        invoice_id = %payload.id,
                        queue = %destination,
                        error = %e,
                        "Failed to publish invoice notification"
                    );
                }
            }
        });
    }
}

fn validate(invoice: &mut Invoice) -> Result<(), ServiceError> {
    if invoice.total_value <= Decimal::ZERO {
        return Err(invalid("Total value must be greater than zero"));
    }
    if exceeds(&invoice.number, MAX_NUMBER_LEN) {
        return Err(invalid("Invoice number cannot exceed 50 characters"));
    }
    if exceeds(&invoice.jurisdiction_code, MAX_JURISDICTION_LEN) {
        return Err(invalid("Jurisdiction code cannot exceed 100 characters"));
    }

    let issuer = invoice
        .issuer
        .as_mut()
        .ok_or_else(|| invalid("Issuer is required"))?;
    issuer.practitioner_id = parse_id(&issuer.practitioner_id)
        .map_err(|_| invalid("Issuer practitioner ID must be a valid, non-empty UUID"))?;

    if invoice.payer.is_none() {
        return Err(invalid("Payer is required"));
    }
    if invoice.services.is_empty() {
        return Err(invalid("At least one service is required"));
    }

    for item in &invoice.services {
        if item.quantity < 0 {
            return Err(invalid("Service quantity cannot be negative"));
        }
        if item.unit_value < Decimal::ZERO {
            return Err(invalid("Service unit value cannot be negative"));
        }
        ensure_percentage("Service ISS rate", item.iss_rate)?;
    }
    invoice.line_total()?;
    Ok(())
}
