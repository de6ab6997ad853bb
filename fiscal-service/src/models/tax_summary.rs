use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AmountOverflow;

/// Monthly tax totals for one practitioner. At most one per period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxSummary {
    #[serde(rename = "_id")]
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
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub calculated_at: DateTime<Utc>,
}

impl TaxSummary {
    pub fn category_sum(&self) -> Result<Decimal, AmountOverflow> {
        [
            self.iss_total,
            self.irpj_total,
            self.csll_total,
            self.pis_total,
            self.cofins_total,
            self.inss_total,
        ]
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, tax| {
            sum.checked_add(tax).ok_or(AmountOverflow("Total taxes"))
        })
    }

    /// Re-derives `total_taxes` and `net_revenue` from the category totals.
    pub fn recompute_derived(&mut self) -> Result<(), AmountOverflow> {
        let total_taxes = self.category_sum()?;
        self.net_revenue = self
            .gross_revenue
            .checked_sub(total_taxes)
            .ok_or(AmountOverflow("Net revenue"))?;
        self.total_taxes = total_taxes;
        Ok(())
    }
}
