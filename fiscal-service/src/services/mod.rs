pub mod bill;
pub mod database;
pub mod error;
pub mod invoice;
pub mod metrics;
pub mod notification;
pub mod queue;
pub mod rate_table;
pub mod repository;
pub mod seeder;
pub mod tax_aggregation;
pub mod tax_summary;
pub mod validation;

pub use bill::BillService;
pub use database::{MongoDb, MongoRepository};
pub use error::ServiceError;
pub use invoice::InvoiceService;
pub use metrics::{get_metrics, init_metrics};
pub use notification::InvoiceNotification;
pub use queue::{InMemoryQueue, MessageQueue, QueueError, QueueMessage, RedisQueue};
pub use rate_table::RateTableService;
pub use repository::{
    BillRepository, Entity, InMemoryRepository, InvoiceRepository, RateTableRepository,
    Repository, TaxSummaryRepository,
};
pub use seeder::seed_rate_tables;
pub use tax_summary::TaxSummaryService;
