use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{opt_chrono_datetime_as_bson_datetime, AmountOverflow};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Authorized,
    Issued,
    Sent,
    Paid,
    Cancelled,
    Rejected,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Authorized => write!(f, "authorized"),
            InvoiceStatus::Issued => write!(f, "issued"),
            InvoiceStatus::Sent => write!(f, "sent"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Cancelled => write!(f, "cancelled"),
            InvoiceStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Issuing practitioner as recorded on the invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PractitionerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub practitioner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipal_registration: Option<String>,
}

/// The party the service was rendered to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceTaker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
}

/// One billed service. The line total is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceLineItem {
    pub description: String,
    pub quantity: i32,
    pub unit_value: Decimal,
    #[serde(default)]
    pub iss_rate: Decimal,
}

impl ServiceLineItem {
    pub fn total(&self) -> Result<Decimal, AmountOverflow> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_value)
            .ok_or(AmountOverflow("Service line total"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issue_date: DateTime<Utc>,
    pub total_value: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction_code: Option<String>,
    #[serde(default)]
    pub service_tax_withheld: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<PractitionerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<ServiceTaker>,
    #[serde(default)]
    pub services: Vec<ServiceLineItem>,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub email_sent_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn practitioner_id(&self) -> Option<&str> {
        self.issuer.as_ref().map(|p| p.practitioner_id.as_str())
    }

    /// Sum of the derived line totals.
    pub fn line_total(&self) -> Result<Decimal, AmountOverflow> {
        self.services.iter().try_fold(Decimal::ZERO, |sum, item| {
            sum.checked_add(item.total()?)
                .ok_or(AmountOverflow("Invoice line total"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, unit_value: Decimal) -> ServiceLineItem {
        ServiceLineItem {
            description: "Consulta".to_string(),
            quantity,
            unit_value,
            iss_rate: dec!(5),
        }
    }

    #[test]
    fn line_total_is_quantity_times_unit_value() {
        assert_eq!(line(3, dec!(150.50)).total(), Ok(dec!(451.50)));
        assert_eq!(line(0, dec!(99)).total(), Ok(Decimal::ZERO));
    }

    #[test]
    fn oversized_line_reports_overflow() {
        assert!(line(10, dec!(10000000000000000000000000000)).total().is_err());
    }

    #[test]
    fn invoice_line_total_sums_lines() {
        let invoice = Invoice {
            id: "a".to_string(),
            number: None,
            issue_date: Utc::now(),
            total_value: dec!(700),
            status: InvoiceStatus::default(),
            jurisdiction_code: None,
            service_tax_withheld: false,
            issuer: None,
            payer: None,
            services: vec![line(2, dec!(200)), line(1, dec!(300))],
            email_sent: false,
            email_sent_at: None,
        };
        assert_eq!(invoice.line_total(), Ok(dec!(700)));
        assert_eq!(invoice.practitioner_id(), None);
    }

    #[test]
    fn line_sum_overflow_is_an_error() {
        let invoice = Invoice {
            id: "b".to_string(),
            number: None,
            issue_date: Utc::now(),
            total_value: dec!(1),
            status: InvoiceStatus::default(),
            jurisdiction_code: None,
            service_tax_withheld: false,
            issuer: None,
            payer: None,
            services: vec![line(1, Decimal::MAX), line(1, Decimal::MAX)],
            email_sent: false,
            email_sent_at: None,
        };
        assert_eq!(invoice.line_total(), Err(AmountOverflow("Invoice line total")));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&InvoiceStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(InvoiceStatus::default().to_string(), "authorized");
    }
}
