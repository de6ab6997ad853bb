use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Invoice, InvoiceStatus, PractitionerProfile, ServiceLineItem, ServiceTaker};

/// Body of `POST /invoices` and `PUT /invoices/:id`.
///
/// The id and issue date are server-assigned; line totals are derived.
#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(max = 50, message = "Invoice number cannot exceed 50 characters"))]
    pub number: Option<String>,
    pub total_value: Decimal,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[validate(length(max = 100, message = "Jurisdiction code cannot exceed 100 characters"))]
    pub jurisdiction_code: Option<String>,
    #[serde(default)]
    pub service_tax_withheld: bool,
    pub issuer: Option<PractitionerProfile>,
    pub payer: Option<ServiceTaker>,
    #[serde(default)]
    #[validate(nested)]
    pub services: Vec<ServiceLineItemRequest>,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub email_sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceLineItemRequest {
    pub description: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub unit_value: Decimal,
    #[serde(default)]
    pub iss_rate: Decimal,
}

impl InvoiceRequest {
    pub fn into_model(self) -> Invoice {
        Invoice {
            id: self.id.unwrap_or_default(),
            number: self.number,
            issue_date: Utc::now(),
            total_value: self.total_value,
            status: self.status.unwrap_or_default(),
            jurisdiction_code: self.jurisdiction_code,
            service_tax_withheld: self.service_tax_withheld,
            issuer: self.issuer,
            payer: self.payer,
            services: self
                .services
                .into_iter()
                .map(|s| ServiceLineItem {
                    description: s.description,
                    quantity: s.quantity,
                    unit_value: s.unit_value,
                    iss_rate: s.iss_rate,
                })
                .collect(),
            email_sent: self.email_sent,
            email_sent_at: self.email_sent_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceLineItemResponse {
    pub description: String,
    pub quantity: i32,
    pub unit_value: Decimal,
    pub iss_rate: Decimal,
    /// `None` when the stored line cannot be totalled.
    pub total: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub number: Option<String>,
    pub issue_date: String,
    pub total_value: Decimal,
    pub status: InvoiceStatus,
    pub jurisdiction_code: Option<String>,
    pub service_tax_withheld: bool,
    pub issuer: Option<PractitionerProfile>,
    pub payer: Option<ServiceTaker>,
    pub services: Vec<ServiceLineItemResponse>,
    pub line_total: Option<Decimal>,
    pub email_sent: bool,
    pub email_sent_at: Option<String>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let line_total = invoice.line_total().ok();
        Self {
            id: invoice.id,
            number: invoice.number,
            issue_date: invoice.issue_date.to_rfc3339(),
            total_value: invoice.total_value,
            status: invoice.status,
            jurisdiction_code: invoice.jurisdiction_code,
            service_tax_withheld: invoice.service_tax_withheld,
            issuer: invoice.issuer,
            payer: invoice.payer,
            services: invoice
                .services
                .into_iter()
                .map(|s| ServiceLineItemResponse {
                    total: s.total().ok(),
                    description: s.description,
                    quantity: s.quantity,
                    unit_value: s.unit_value,
                    iss_rate: s.iss_rate,
                })
                .collect(),
            line_total,
            email_sent: invoice.email_sent,
            email_sent_at: invoice.email_sent_at.map(|d| d.to_rfc3339()),
        }
    }
}
