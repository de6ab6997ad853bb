use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::{InvoiceStatus, PractitionerProfile};
use super::{opt_chrono_datetime_as_bson_datetime, AmountOverflow};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Pending,
    Sent,
    Paid,
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillStatus::Pending => write!(f, "pending"),
            BillStatus::Sent => write!(f, "sent"),
            BillStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Snapshot of an invoice grouped into a bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillInvoice {
    pub invoice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issue_date: DateTime<Utc>,
    pub value: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "_id")]
    pub id: String,
    pub bill_number: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issue_date: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub sent_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub payment_date: Option<DateTime<Utc>>,
    pub total_value: Decimal,
    #[serde(default)]
    pub status: BillStatus,
    pub practitioner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practitioner: Option<PractitionerProfile>,
    #[serde(default)]
    pub invoices: Vec<BillInvoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Bill {
    /// Sum of the embedded invoice values; zero for an empty bill.
    pub fn invoices_total(&self) -> Result<Decimal, AmountOverflow> {
        self.invoices.iter().try_fold(Decimal::ZERO, |sum, i| {
            sum.checked_add(i.value).ok_or(AmountOverflow("Bill total"))
        })
    }
}
