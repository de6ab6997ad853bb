use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::error::ServiceError;
use super::repository::{
    BillRepository, Entity, InvoiceRepository, RateTableRepository, Repository,
    TaxSummaryRepository,
};
use crate::config::MongoConfig;
use crate::models::{Bill, Invoice, RateTable, TaxSummary};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    config: MongoConfig,
}

impl MongoDb {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(database = %config.database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(&config.database);
        tracing::info!(database = %config.database, "Successfully connected to MongoDB database");
        Ok(Self {
            client,
            db,
            config: config.clone(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for fiscal-service");

        create_index(
            &self.invoices(),
            doc! { "number": 1 },
            "invoice_number_lookup",
            false,
        )
        .await?;
        create_index(
            &self.invoices(),
            doc! { "issue_date": -1 },
            "invoice_issue_date_desc",
            false,
        )
        .await?;
        create_index(&self.invoices(), doc! { "status": 1 }, "invoice_status", false).await?;
        create_index(
            &self.invoices(),
            doc! { "issuer.practitioner_id": 1 },
            "invoice_practitioner_lookup",
            false,
        )
        .await?;

        create_index(&self.bills(), doc! { "bill_number": 1 }, "bill_number_lookup", false)
            .await?;
        create_index(
            &self.bills(),
            doc! { "practitioner_id": 1 },
            "bill_practitioner_lookup",
            false,
        )
        .await?;
        create_index(&self.bills(), doc! { "status": 1 }, "bill_status", false).await?;

        create_index(
            &self.rate_tables(),
            doc! { "jurisdiction_code": 1 },
            "jurisdiction_code_unique",
            true,
        )
        .await?;
        create_index(
            &self.rate_tables(),
            doc! { "state_code": 1 },
            "rate_table_state_lookup",
            false,
        )
        .await?;

        create_index(
            &self.tax_summaries(),
            doc! { "practitioner_id": 1, "month": 1, "year": 1 },
            "tax_summary_period_unique",
            true,
        )
        .await?;
        create_index(
            &self.tax_summaries(),
            doc! { "practitioner_id": 1 },
            "tax_summary_practitioner_lookup",
            false,
        )
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection(&self.config.invoices_collection)
    }

    pub fn bills(&self) -> Collection<Bill> {
        self.db.collection(&self.config.bills_collection)
    }

    pub fn rate_tables(&self) -> Collection<RateTable> {
        self.db.collection(&self.config.rate_tables_collection)
    }

    pub fn tax_summaries(&self) -> Collection<TaxSummary> {
        self.db.collection(&self.config.tax_summaries_collection)
    }
}

async fn create_index<T>(
    collection: &Collection<T>,
    keys: Document,
    name: &str,
    unique: bool,
) -> Result<(), AppError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(
            "Failed to create index {} on {} collection: {}",
            name,
            collection.name(),
            e
        );
        AppError::from(e)
    })?;
    tracing::info!("Created index {} on {}", name, collection.name());
    Ok(())
}

/// [`Repository`] over one MongoDB collection.
#[derive(Clone)]
pub struct MongoRepository<T> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<T>, ServiceError> {
        let cursor = self.collection.find(filter, None).await.map_err(|e| {
            tracing::error!("Failed to query {}: {}", self.collection.name(), e);
            e
        })?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        self.find_many(doc! {}).await
    }

    async fn insert(&self, entity: &T) -> Result<(), ServiceError> {
        self.collection.insert_one(entity, None).await?;
        Ok(())
    }

    async fn replace(&self, entity: &T) -> Result<bool, ServiceError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": entity.id() }, entity, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl InvoiceRepository for MongoRepository<Invoice> {
    async fn find_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<Invoice>, ServiceError> {
        self.find_many(doc! { "issuer.practitioner_id": practitioner_id })
            .await
    }
}

#[async_trait]
impl BillRepository for MongoRepository<Bill> {
    async fn find_by_practitioner(&self, practitioner_id: &str) -> Result<Vec<Bill>, ServiceError> {
        self.find_many(doc! { "practitioner_id": practitioner_id }).await
    }
}

#[async_trait]
impl RateTableRepository for MongoRepository<RateTable> {
    async fn find_by_code(&self, code: &str) -> Result<Option<RateTable>, ServiceError> {
        Ok(self
            .collection
            .find_one(doc! { "jurisdiction_code": code }, None)
            .await?)
    }
}

#[async_trait]
impl TaxSummaryRepository for MongoRepository<TaxSummary> {
    async fn find_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<TaxSummary>, ServiceError> {
        self.find_many(doc! { "practitioner_id": practitioner_id }).await
    }

    async fn find_by_period(
        &self,
        practitioner_id: &str,
        month: i32,
        year: i32,
    ) -> Result<Option<TaxSummary>, ServiceError> {
        Ok(self
            .collection
            .find_one(
                doc! { "practitioner_id": practitioner_id, "month": month, "year": year },
                None,
            )
            .await?)
    }

    async fn upsert_by_period(&self, summary: &TaxSummary) -> Result<TaxSummary, ServiceError> {
        let mut fields =
            mongodb::bson::to_document(summary).map_err(|e| ServiceError::Internal(e.into()))?;
        fields.remove("_id");

        let filter = doc! {
            "practitioner_id": &summary.practitioner_id,
            "month": summary.month,
            "year": summary.year,
        };
        let update = doc! {
            "$set": fields,
            "$setOnInsert": { "_id": &summary.id },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(filter, update, options)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow::anyhow!(
                    "Upsert of tax summary returned no document"
                ))
            })
    }
}
