//! Monthly tax aggregation.
//!
//! Pure functions: the caller loads invoices and resolves rate tables, this
//! module filters and sums. Every amount is exact decimal arithmetic and every
//! sum is checked; a total outside the `Decimal` range is an error.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use crate::models::{AmountOverflow, Invoice, RateTable};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
pub const MIN_YEAR: i32 = 2000;

/// Per-category totals for one period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxTotals {
    pub gross_revenue: Decimal,
    pub iss: Decimal,
    pub irpj: Decimal,
    pub csll: Decimal,
    pub pis: Decimal,
    pub cofins: Decimal,
    pub inss: Decimal,
    pub invoice_count: i64,
}

impl TaxTotals {
    pub fn total_taxes(&self) -> Result<Decimal, AmountOverflow> {
        [self.iss, self.irpj, self.csll, self.pis, self.cofins, self.inss]
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, tax| checked_add(sum, tax, "Total taxes"))
    }

    pub fn net_revenue(&self) -> Result<Decimal, AmountOverflow> {
        self.gross_revenue
            .checked_sub(self.total_taxes()?)
            .ok_or(AmountOverflow("Net revenue"))
    }

    fn add_taxes(&mut self, value: Decimal, rates: [Decimal; 6]) -> Result<(), AmountOverflow> {
        let categories = [
            &mut self.iss,
            &mut self.irpj,
            &mut self.csll,
            &mut self.pis,
            &mut self.cofins,
            &mut self.inss,
        ];
        for (total, rate) in categories.into_iter().zip(rates) {
            *total = checked_add(*total, tax_amount(value, rate)?, "Tax total")?;
        }
        Ok(())
    }
}

fn checked_add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, AmountOverflow> {
    a.checked_add(b).ok_or(AmountOverflow(what))
}

/// `value × rate / 100`. The rate is scaled first so a large value only
/// overflows when the tax itself would.
fn tax_amount(value: Decimal, rate: Decimal) -> Result<Decimal, AmountOverflow> {
    rate.checked_div(HUNDRED)
        .and_then(|fraction| value.checked_mul(fraction))
        .ok_or(AmountOverflow("Tax amount"))
}

/// Accepts months 1..=12 and years 2000..=current+1.
pub fn validate_period(month: i32, year: i32) -> Result<(), String> {
    if !(1..=12).contains(&month) {
        return Err(format!("Month must be between 1 and 12, got {}", month));
    }
    let max_year = Utc::now().year() + 1;
    if !(MIN_YEAR..=max_year).contains(&year) {
        return Err(format!(
            "Year must be between {} and {}, got {}",
            MIN_YEAR, max_year, year
        ));
    }
    Ok(())
}

/// Invoices whose UTC issue date falls in the given month.
pub fn invoices_in_period(invoices: Vec<Invoice>, month: i32, year: i32) -> Vec<Invoice> {
    invoices
        .into_iter()
        .filter(|i| i.issue_date.month() as i32 == month && i.issue_date.year() == year)
        .collect()
}

/// Distinct non-blank jurisdiction codes, sorted.
pub fn jurisdiction_codes(invoices: &[Invoice]) -> Vec<String> {
    invoices
        .iter()
        .filter_map(|i| i.jurisdiction_code.as_deref())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sums revenue and the six tax categories.
///
/// An invoice whose jurisdiction has no rate table still counts towards gross
/// revenue and `invoice_count` but contributes no tax.
pub fn aggregate(
    invoices: &[Invoice],
    rate_tables: &[RateTable],
) -> Result<TaxTotals, AmountOverflow> {
    let by_code: HashMap<&str, &RateTable> = rate_tables
        .iter()
        .map(|r| (r.jurisdiction_code.as_str(), r))
        .collect();

    let mut totals = TaxTotals::default();
    for invoice in invoices {
        totals.gross_revenue =
            checked_add(totals.gross_revenue, invoice.total_value, "Gross revenue")?;
        totals.invoice_count += 1;

        let rate_table = invoice
            .jurisdiction_code
            .as_deref()
            .and_then(|code| by_code.get(code));
        if let Some(rate_table) = rate_table {
            totals.add_taxes(invoice.total_value, rate_table.rates())?;
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn invoice(value: Decimal, code: Option<&str>, year: i32, month: u32, day: u32) -> Invoice {
        Invoice {
            id: format!("inv-{}-{}", month, day),
            number: None,
            issue_date: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
            total_value: value,
            status: InvoiceStatus::Authorized,
            jurisdiction_code: code.map(str::to_string),
            service_tax_withheld: false,
            issuer: None,
            payer: None,
            services: Vec::new(),
            email_sent: false,
            email_sent_at: None,
        }
    }

    fn rate_table(code: &str, iss: Decimal, irpj: Option<Decimal>) -> RateTable {
        RateTable {
            id: format!("rt-{}", code),
            jurisdiction_code: code.to_string(),
            name: "Test".to_string(),
            state_code: "SP".to_string(),
            iss_rate: iss,
            irpj_rate: irpj,
            csll_rate: None,
            pis_rate: None,
            cofins_rate: None,
            inss_rate: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn sums_each_category_across_jurisdictions() {
        let invoices = vec![
            invoice(dec!(1000), Some("3550308"), 2024, 3, 10),
            invoice(dec!(2000), Some("3304557"), 2024, 3, 20),
        ];
        let tables = vec![
            rate_table("3550308", dec!(5), Some(dec!(4.8))),
            rate_table("3304557", dec!(3), None),
        ];

        let totals = aggregate(&invoices, &tables).unwrap();

        assert_eq!(totals.gross_revenue, dec!(3000));
        assert_eq!(totals.iss, dec!(110));
        assert_eq!(totals.irpj, dec!(48));
        assert_eq!(totals.csll, Decimal::ZERO);
        assert_eq!(totals.total_taxes(), Ok(dec!(158)));
        assert_eq!(totals.net_revenue(), Ok(dec!(2842)));
        assert_eq!(totals.invoice_count, 2);
    }

    #[test]
    fn missing_rate_table_contributes_zero_tax() {
        let invoices = vec![
            invoice(dec!(1000), Some("3550308"), 2024, 3, 1),
            invoice(dec!(500), Some("9999999"), 2024, 3, 2),
            invoice(dec!(250), None, 2024, 3, 3),
        ];
        let tables = vec![rate_table("3550308", dec!(5), None)];

        let totals = aggregate(&invoices, &tables).unwrap();

        assert_eq!(totals.gross_revenue, dec!(1750));
        assert_eq!(totals.iss, dec!(50));
        assert_eq!(totals.invoice_count, 3);
    }

    #[test]
    fn fractional_rates_stay_exact() {
        let invoices = vec![invoice(dec!(333.33), Some("1"), 2024, 1, 1)];
        let tables = vec![rate_table("1", dec!(2.88), None)];

        let totals = aggregate(&invoices, &tables).unwrap();

        assert_eq!(totals.iss, dec!(9.599904));
    }

    #[test]
    fn large_value_with_rate_does_not_overflow() {
        let invoices = vec![invoice(dec!(50000000000000000000000000000), Some("1"), 2024, 3, 1)];
        let tables = vec![rate_table("1", dec!(5), None)];

        let totals = aggregate(&invoices, &tables).unwrap();

        assert_eq!(totals.iss, dec!(2500000000000000000000000000));
    }

    #[test]
    fn gross_revenue_overflow_is_an_error() {
        let invoices = vec![
            invoice(dec!(50000000000000000000000000000), None, 2024, 3, 1),
            invoice(dec!(50000000000000000000000000000), None, 2024, 3, 2),
        ];

        assert_eq!(aggregate(&invoices, &[]), Err(AmountOverflow("Gross revenue")));
    }

    #[test]
    fn filters_by_month_and_year() {
        let invoices = vec![
            invoice(dec!(1), None, 2024, 3, 31),
            invoice(dec!(1), None, 2024, 4, 1),
            invoice(dec!(1), None, 2023, 3, 15),
        ];

        let march = invoices_in_period(invoices, 3, 2024);

        assert_eq!(march.len(), 1);
        assert_eq!(march[0].id, "inv-3-31");
    }

    #[test]
    fn collects_distinct_non_blank_codes() {
        let invoices = vec![
            invoice(dec!(1), Some("3550308"), 2024, 3, 1),
            invoice(dec!(1), Some("3550308"), 2024, 3, 2),
            invoice(dec!(1), Some("   "), 2024, 3, 3),
            invoice(dec!(1), Some("3304557"), 2024, 3, 4),
            invoice(dec!(1), None, 2024, 3, 5),
        ];

        assert_eq!(jurisdiction_codes(&invoices), vec!["3304557", "3550308"]);
    }

    #[test]
    fn rejects_out_of_range_periods() {
        let next_year = Utc::now().year() + 1;

        assert!(validate_period(1, 2000).is_ok());
        assert!(validate_period(12, next_year).is_ok());
        assert!(validate_period(0, 2024).is_err());
        assert!(validate_period(13, 2024).is_err());
        assert!(validate_period(6, 1999).is_err());
        assert!(validate_period(6, next_year + 1).is_err());
    }
}
