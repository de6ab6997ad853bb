use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::TaxSummary;

/// Direct create/update body. `total_taxes` and `net_revenue` are derived.
#[derive(Debug, Deserialize, Validate)]
pub struct TaxSummaryRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub practitioner_id: String,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,
    pub year: i32,
    pub gross_revenue: Decimal,
    #[serde(default)]
    pub iss_total: Decimal,
    #[serde(default)]
    pub irpj_total: Decimal,
    #[serde(default)]
    pub csll_total: Decimal,
    #[serde(default)]
    pub pis_total: Decimal,
    #[serde(default)]
    pub cofins_total: Decimal,
    #[serde(default)]
    pub inss_total: Decimal,
    #[serde(default)]
    pub invoice_count: i64,
}

impl TaxSummaryRequest {
    pub fn into_model(self) -> TaxSummary {
        TaxSummary {
            id: self.id.unwrap_or_default(),
            practitioner_id: self.practitioner_id,
            month: self.month,
            year: self.year,
            gross_revenue: self.gross_revenue,
            iss_total: self.iss_total,
            irpj_total: self.irpj_total,
            csll_total: self.csll_total,
            pis_total: self.pis_total,
            cofins_total: self.cofins_total,
            inss_total: self.inss_total,
            total_taxes: Decimal::ZERO,
            net_revenue: Decimal::ZERO,
            invoice_count: self.invoice_count,
            calculated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    pub month: i32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct ComputeParams {
    pub practitioner_id: String,
    pub month: i32,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct TaxSummaryResponse {
    pub id: String,
    pub practitioner_id: String,
    pub month: i32,
    pub year: i32,
    pub gross_revenue: Decimal,
    pub iss_total: Decimal,
    pub irpj_total: Decimal,
    pub csll_total: Decimal,
    pub pis_total: Decimal,
    pub cofins_total: Decimal,
    pub inss_total: Decimal,
    pub total_taxes: Decimal,
    pub net_revenue: Decimal,
    pub invoice_count: i64,
    pub calculated_at: String,
}

impl From<TaxSummary> for TaxSummaryResponse {
    fn from(s: TaxSummary) -> Self {
        Self {
            id: s.id,
            practitioner_id: s.practitioner_id,
            month: s.month,
            year: s.year,
            gross_revenue: s.gross_revenue,
            iss_total: s.iss_total,
            irpj_total: s.irpj_total,
            csll_total: s.csll_total,
            pis_total: s.pis_total,
            cofins_total: s.cofins_total,
            inss_total: s.inss_total,
            total_taxes: s.total_taxes,
            net_revenue: s.net_revenue,
            invoice_count: s.invoice_count,
            calculated_at: s.calculated_at.to_rfc3339(),
        }
    }
}
