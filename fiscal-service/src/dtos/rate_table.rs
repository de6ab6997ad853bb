use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::RateTable;

#[derive(Debug, Deserialize, Validate)]
pub struct RateTableRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Jurisdiction code is required"))]
    pub jurisdiction_code: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(equal = 2, message = "State code must have exactly 2 characters"))]
    pub state_code: String,
    pub iss_rate: Decimal,
    pub irpj_rate: Option<Decimal>,
    pub csll_rate: Option<Decimal>,
    pub pis_rate: Option<Decimal>,
    pub cofins_rate: Option<Decimal>,
    pub inss_rate: Option<Decimal>,
}

impl RateTableRequest {
    pub fn into_model(self) -> RateTable {
        RateTable {
            id: self.id.unwrap_or_default(),
            jurisdiction_code: self.jurisdiction_code,
            name: self.name,
            state_code: self.state_code,
            iss_rate: self.iss_rate,
            irpj_rate: self.irpj_rate,
            csll_rate: self.csll_rate,
            pis_rate: self.pis_rate,
            cofins_rate: self.cofins_rate,
            inss_rate: self.inss_rate,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateTableResponse {
    pub id: String,
    pub jurisdiction_code: String,
    pub name: String,
    pub state_code: String,
    pub iss_rate: Decimal,
    pub irpj_rate: Option<Decimal>,
    pub csll_rate: Option<Decimal>,
    pub pis_rate: Option<Decimal>,
    pub cofins_rate: Option<Decimal>,
    pub inss_rate: Option<Decimal>,
    pub last_updated: String,
}

impl From<RateTable> for RateTableResponse {
    fn from(rt: RateTable) -> Self {
        Self {
            id: rt.id,
            jurisdiction_code: rt.jurisdiction_code,
            name: rt.name,
            state_code: rt.state_code,
            iss_rate: rt.iss_rate,
            irpj_rate: rt.irpj_rate,
            csll_rate: rt.csll_rate,
            pis_rate: rt.pis_rate,
            cofins_rate: rt.cofins_rate,
            inss_rate: rt.inss_rate,
            last_updated: rt.last_updated.to_rfc3339(),
        }
    }
}
