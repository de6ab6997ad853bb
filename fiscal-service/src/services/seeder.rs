use chrono::Utc;
use rust_decimal::Decimal;

use super::error::ServiceError;
use super::repository::{RateTableRepository, Repository};
use super::validation::new_id;
use crate::models::RateTable;

/// Capital cities loaded into an empty rate table: (IBGE code, name, state).
const DEFAULT_JURISDICTIONS: [(&str, &str, &str); 5] = [
    ("3550308", "São Paulo", "SP"),
    ("3304557", "Rio de Janeiro", "RJ"),
    ("3106200", "Belo Horizonte", "MG"),
    ("5300108", "Brasília", "DF"),
    ("4314902", "Porto Alegre", "RS"),
];

fn default_rate_table(code: &str, name: &str, state: &str) -> RateTable {
    RateTable {
        id: new_id(),
        jurisdiction_code: code.to_string(),
        name: name.to_string(),
        state_code: state.to_string(),
        iss_rate: Decimal::new(5, 0),
        irpj_rate: Some(Decimal::new(48, 1)),
        csll_rate: Some(Decimal::new(288, 2)),
        pis_rate: Some(Decimal::new(65, 2)),
        cofins_rate: Some(Decimal::new(3, 0)),
        inss_rate: Some(Decimal::new(11, 0)),
        last_updated: Utc::now(),
    }
}

/// Seeds the default jurisdictions when the collection is empty.
///
/// Returns how many entries were inserted.
pub async fn seed_rate_tables(repo: &dyn RateTableRepository) -> Result<usize, ServiceError> {
    if !repo.find_all().await?.is_empty() {
        tracing::info!("Rate tables already present, skipping seed");
        return Ok(0);
    }

    for (code, name, state) in DEFAULT_JURISDICTIONS {
        repo.insert(&default_rate_table(code, name, state)).await?;
    }
    tracing::info!(count = DEFAULT_JURISDICTIONS.len(), "Seeded default rate tables");
    Ok(DEFAULT_JURISDICTIONS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::repository::InMemoryRepository;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn seeds_once() {
        let repo = InMemoryRepository::<RateTable>::new();

        assert_eq!(seed_rate_tables(&repo).await.unwrap(), 5);
        assert_eq!(seed_rate_tables(&repo).await.unwrap(), 0);

        let sao_paulo = repo.find_by_code("3550308").await.unwrap().unwrap();
        assert_eq!(sao_paulo.state_code, "SP");
        assert_eq!(sao_paulo.iss_rate, dec!(5));
        assert_eq!(sao_paulo.irpj_rate, Some(dec!(4.8)));
        assert_eq!(sao_paulo.csll_rate, Some(dec!(2.88)));
        assert_eq!(sao_paulo.pis_rate, Some(dec!(0.65)));
        assert_eq!(sao_paulo.cofins_rate, Some(dec!(3)));
        assert_eq!(sao_paulo.inss_rate, Some(dec!(11)));
    }
}
