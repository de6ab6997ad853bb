//! Integration payload published when an invoice is created.
//!
//! Field names on the wire follow the downstream invoice-issuing integration,
//! hence the renames.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Invoice;

pub const NOTIFICATION_SUBJECT: &str = "InvoiceNotification";
const DEFAULT_SERVICE_CODE: &str = "001";

/// IBGE codes for the municipalities the integration knows about.
const IBGE_CODES: [(&str, &str); 10] = [
    ("São Paulo", "3550308"),
    ("Rio de Janeiro", "3304557"),
    ("Belo Horizonte", "3106200"),
    ("Brasília", "5300108"),
    ("Salvador", "2927408"),
    ("Fortaleza", "2304400"),
    ("Curitiba", "4106902"),
    ("Recife", "2611606"),
    ("Porto Alegre", "4314902"),
    ("Manaus", "1302603"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceNotification {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "numeroNota")]
    pub number: String,
    #[serde(rename = "codigo_servico")]
    pub service_code: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor", with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(rename = "cpf_cnpj_cliente")]
    pub payer_tax_id: String,
    #[serde(rename = "cliente")]
    pub payer_name: String,
    pub email: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "endereco")]
    pub street: String,
    #[serde(rename = "numero")]
    pub house_number: String,
    #[serde(rename = "bairro")]
    pub district: String,
    #[serde(rename = "codigo_municipio")]
    pub municipality_code: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
    #[serde(rename = "uf")]
    pub state: String,
}

impl From<&Invoice> for InvoiceNotification {
    fn from(invoice: &Invoice) -> Self {
        let payer = invoice.payer.clone().unwrap_or_default();
        let address = payer.address.unwrap_or_default();
        let full_municipality = payer.municipality.unwrap_or_default();
        let parts = AddressParts::parse(&address);
        let (municipality, state) = split_municipality(&full_municipality);

        Self {
            id: invoice.id.clone(),
            number: invoice.number.clone().unwrap_or_default(),
            service_code: DEFAULT_SERVICE_CODE.to_string(),
            description: invoice
                .services
                .first()
                .map(|s| s.description.clone())
                .unwrap_or_default(),
            value: invoice.total_value,
            payer_tax_id: payer.tax_id.unwrap_or_default(),
            payer_name: payer.name.unwrap_or_default(),
            email: payer.email.unwrap_or_default(),
            postal_code: extract_postal_code(&address),
            street: parts.street,
            house_number: parts.number,
            district: parts.district,
            municipality_code: ibge_code(&municipality).unwrap_or_default().to_string(),
            municipality,
            state,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct AddressParts {
    street: String,
    number: String,
    district: String,
}

impl AddressParts {
    /// Parses `"Street, 123 - District"`.
    fn parse(address: &str) -> Self {
        if address.trim().is_empty() {
            return Self::default();
        }
        let mut parts = address.split([',', '-']).map(str::trim);
        let street = parts.next().unwrap_or_default().to_string();
        let number = parts
            .next()
            .and_then(|p| p.split_whitespace().next())
            .unwrap_or_default()
            .to_string();
        let district = parts.next().unwrap_or_default().to_string();
        Self {
            street,
            number,
            district,
        }
    }
}

/// Splits `"City - UF"` or `"City/UF"` into name and state code.
fn split_municipality(full: &str) -> (String, String) {
    let (name, state) = if let Some((name, state)) = full.split_once(" - ") {
        (name, state)
    } else if let Some((name, state)) = full.split_once('/') {
        (name, state)
    } else {
        (full, "")
    };
    (name.trim().to_string(), state.trim().to_string())
}

/// First 8-digit token, formatted `NNNNN-NNN`.
fn extract_postal_code(address: &str) -> String {
    address
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|word| word.chars().filter(char::is_ascii_digit).collect::<String>())
        .find(|digits| digits.len() == 8)
        .map(|digits| format!("{}-{}", &digits[..5], &digits[5..]))
        .unwrap_or_default()
}

fn ibge_code(municipality: &str) -> Option<&'static str> {
    let wanted = municipality.to_lowercase();
    IBGE_CODES
        .iter()
        .find(|(name, _)| name.to_lowercase() == wanted)
        .map(|(_, code)| *code)
}
