use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Municipal tax rates, keyed by the IBGE jurisdiction code.
///
/// Rates are percentages in `[0, 100]`. Only the service-tax (ISS) rate is
/// mandatory; an unset federal rate counts as zero during aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(rename = "_id")]
    pub id: String,
    pub jurisdiction_code: String,
    pub name: String,
    pub state_code: String,
    pub iss_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irpj_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csll_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pis_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cofins_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inss_rate: Option<Decimal>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

impl RateTable {
    /// All six rates in category order, unset ones as zero.
    pub fn rates(&self) -> [Decimal; 6] {
        [
            self.iss_rate,
            self.irpj_rate.unwrap_or_default(),
            self.csll_rate.unwrap_or_default(),
            self.pis_rate.unwrap_or_default(),
            self.cofins_rate.unwrap_or_default(),
            self.inss_rate.unwrap_or_default(),
        ]
    }
}
