use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_flag};
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct FiscalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub queue: QueueConfig,
    pub observability: ObservabilityConfig,
    pub seed_rate_tables: bool,
    pub allowed_origins: Vec<String>,
}

/// Connection target plus the collection name of every entity.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub invoices_collection: String,
    pub bills_collection: String,
    pub rate_tables_collection: String,
    pub tax_summaries_collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub enabled: bool,
    pub redis_url: String,
    /// Destination of the invoice integration notification.
    pub invoice_queue: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl FiscalConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let allowed_origins = get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(FiscalConfig {
            common,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("notas_fiscais_db"), is_prod)?,
                invoices_collection: get_env(
                    "MONGODB_INVOICES_COLLECTION",
                    Some("notas_fiscais"),
                    is_prod,
                )?,
                bills_collection: get_env("MONGODB_BILLS_COLLECTION", Some("faturas"), is_prod)?,
                rate_tables_collection: get_env(
                    "MONGODB_RATE_TABLES_COLLECTION",
                    Some("municipios_aliquota"),
                    is_prod,
                )?,
                tax_summaries_collection: get_env(
                    "MONGODB_TAX_SUMMARIES_COLLECTION",
                    Some("impostos_resumo"),
                    is_prod,
                )?,
            },
            queue: QueueConfig {
                enabled: get_env_flag("QUEUE_ENABLED", true)?,
                redis_url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
                invoice_queue: get_env("QUEUE_INVOICE", Some("integracao-nf"), is_prod)?,
            },
            observability: ObservabilityConfig {
                log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                otlp_endpoint: std::env::var("OTLP_ENDPOINT")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            },
            seed_rate_tables: get_env_flag("SEED_RATE_TABLES", !is_prod)?,
            allowed_origins,
        })
    }
}
