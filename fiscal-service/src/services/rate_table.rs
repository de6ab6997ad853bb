use chrono::Utc;
use std::sync::Arc;

use super::error::ServiceError;
use super::repository::{RateTableRepository, Repository};
use super::validation::{assign_id, ensure_percentage, ensure_same_id, invalid, is_valid_id, parse_id};
use crate::models::RateTable;

const ENTITY: &str = "Rate table";

#[derive(Clone)]
pub struct RateTableService {
    repo: Arc<dyn RateTableRepository>,
}

impl RateTableService {
    pub fn new(repo: Arc<dyn RateTableRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: &str) -> Result<RateTable, ServiceError> {
        let id = parse_id(id)?;
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))
    }

    pub async fn list(&self) -> Result<Vec<RateTable>, ServiceError> {
        self.repo.find_all().await
    }

    pub async fn get_by_code(&self, code: &str) -> Result<RateTable, ServiceError> {
        if code.trim().is_empty() {
            return Err(invalid("Jurisdiction code is required"));
        }
        self.repo.find_by_code(code).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Rate table for jurisdiction {} not found", code))
        })
    }

    pub async fn exists_by_code(&self, code: &str) -> Result<bool, ServiceError> {
        if code.trim().is_empty() {
            return Ok(false);
        }
        Ok(self.repo.find_by_code(code).await?.is_some())
    }

    #[tracing::instrument(skip(self, rate_table), fields(code = %rate_table.jurisdiction_code))]
    pub async fn create(&self, mut rate_table: RateTable) -> Result<RateTable, ServiceError> {
        validate(&mut rate_table)?;
        if self
            .repo
            .find_by_code(&rate_table.jurisdiction_code)
            .await?
            .is_some()
        {
            return Err(duplicate_code(&rate_table.jurisdiction_code));
        }

        rate_table.id = assign_id(&rate_table.id)?;
        rate_table.last_updated = Utc::now();
        self.repo.insert(&rate_table).await?;
        tracing::info!(rate_table_id = %rate_table.id, "Rate table created");
        Ok(rate_table)
    }

    #[tracing::instrument(skip(self, rate_table))]
    pub async fn update(
        &self,
        id: &str,
        mut rate_table: RateTable,
    ) -> Result<RateTable, ServiceError> {
        let id = parse_id(id)?;
        ensure_same_id(&id, &rate_table.id)?;
        let existing = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, &id))?;

        validate(&mut rate_table)?;
        if rate_table.jurisdiction_code != existing.jurisdiction_code {
            let taken = self.repo.find_by_code(&rate_table.jurisdiction_code).await?;
            if taken.is_some_and(|other| other.id != id) {
                return Err(duplicate_code(&rate_table.jurisdiction_code));
            }
        }

        rate_table.id = id;
        rate_table.last_updated = Utc::now();
        if !self.repo.replace(&rate_table).await? {
            return Err(ServiceError::not_found(ENTITY, &rate_table.id));
        }
        Ok(rate_table)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        if !self.repo.delete(&id).await? {
            return Err(ServiceError::not_found(ENTITY, &id));
        }
        Ok(())
    }

    pub async fn exists(&self, id: &str) -> Result<bool, ServiceError> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        let id = parse_id(id)?;
        Ok(self.repo.find_by_id(&id).await?.is_some())
    }
}

fn duplicate_code(code: &str) -> ServiceError {
    ServiceError::Conflict(format!("Jurisdiction code {} already exists", code))
}

fn validate(rate_table: &mut RateTable) -> Result<(), ServiceError> {
    rate_table.jurisdiction_code = rate_table.jurisdiction_code.trim().to_string();
    if rate_table.jurisdiction_code.is_empty() {
        return Err(invalid("Jurisdiction code is required"));
    }
    if rate_table.name.trim().is_empty() {
        return Err(invalid("Name is required"));
    }
    if rate_table.state_code.chars().count() != 2 {
        return Err(invalid("State code must have exactly 2 characters"));
    }

    ensure_percentage("ISS rate", rate_table.iss_rate)?;
    let optional = [
        ("IRPJ rate", rate_table.irpj_rate),
        ("CSLL rate", rate_table.csll_rate),
        ("PIS rate", rate_table.pis_rate),
        ("COFINS rate", rate_table.cofins_rate),
        ("INSS rate", rate_table.inss_rate),
    ];
    for (field, rate) in optional {
        if let Some(rate) = rate {
            ensure_percentage(field, rate)?;
        }
    }
    Ok(())
}
