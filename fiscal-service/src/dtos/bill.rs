use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Bill, BillInvoice, BillStatus, InvoiceStatus, PractitionerProfile};

#[derive(Debug, Deserialize, Validate)]
pub struct BillRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Bill number cannot exceed 50 characters"))]
    pub bill_number: String,
    pub due_date: Option<DateTime<Utc>>,
    pub sent_date: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
    pub total_value: Decimal,
    #[serde(default)]
    pub status: Option<BillStatus>,
    pub practitioner_id: String,
    pub practitioner: Option<PractitionerProfile>,
    #[serde(default)]
    pub invoices: Vec<BillInvoiceRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BillInvoiceRequest {
    pub invoice_id: String,
    pub number: Option<String>,
    pub issue_date: DateTime<Utc>,
    pub value: Decimal,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    pub jurisdiction_code: Option<String>,
}

impl BillRequest {
    pub fn into_model(self) -> Bill {
        Bill {
            id: self.id.unwrap_or_default(),
            bill_number: self.bill_number,
            issue_date: Utc::now(),
            due_date: self.due_date,
            sent_date: self.sent_date,
            payment_date: self.payment_date,
            total_value: self.total_value,
            status: self.status.unwrap_or_default(),
            practitioner_id: self.practitioner_id,
            practitioner: self.practitioner,
            invoices: self
                .invoices
                .into_iter()
                .map(|i| BillInvoice {
                    invoice_id: i.invoice_id,
                    number: i.number,
                    issue_date: i.issue_date,
                    value: i.value,
                    status: i.status.unwrap_or_default(),
                    jurisdiction_code: i.jurisdiction_code,
                })
                .collect(),
            notes: self.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillInvoiceResponse {
    pub invoice_id: String,
    pub number: Option<String>,
    pub issue_date: String,
    pub value: Decimal,
    pub status: InvoiceStatus,
    pub jurisdiction_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: String,
    pub bill_number: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub sent_date: Option<String>,
    pub payment_date: Option<String>,
    pub total_value: Decimal,
    pub status: BillStatus,
    pub practitioner_id: String,
    pub practitioner: Option<PractitionerProfile>,
    pub invoices: Vec<BillInvoiceResponse>,
    pub notes: Option<String>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            bill_number: bill.bill_number,
            issue_date: bill.issue_date.to_rfc3339(),
            due_date: bill.due_date.map(|d| d.to_rfc3339()),
            sent_date: bill.sent_date.map(|d| d.to_rfc3339()),
            payment_date: bill.payment_date.map(|d| d.to_rfc3339()),
            total_value: bill.total_value,
            status: bill.status,
            practitioner_id: bill.practitioner_id,
            practitioner: bill.practitioner,
            invoices: bill
                .invoices
                .into_iter()
                .map(|i| BillInvoiceResponse {
                    invoice_id: i.invoice_id,
                    number: i.number,
                    issue_date: i.issue_date.to_rfc3339(),
                    value: i.value,
                    status: i.status,
                    jurisdiction_code: i.jurisdiction_code,
                })
                .collect(),
            notes: bill.notes,
        }
    }
}
