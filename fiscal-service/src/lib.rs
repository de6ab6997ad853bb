//! fiscal-service: invoices, bills, municipal tax-rate tables and monthly
//! tax summaries over HTTP, persisted in MongoDB.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    body::Body,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::axum::http::{header, HeaderValue, Method};
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::FiscalConfig;
use crate::models::{Bill, Invoice, RateTable, TaxSummary};
use crate::services::{
    BillRepository, BillService, InMemoryQueue, InMemoryRepository, InvoiceRepository,
    InvoiceService, MessageQueue, MongoDb, MongoRepository, RateTableRepository,
    RateTableService, TaxSummaryRepository, TaxSummaryService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: FiscalConfig,
    /// `None` when running on in-memory repositories.
    pub db: Option<MongoDb>,
    pub queue: Arc<dyn MessageQueue>,
    pub invoices: InvoiceService,
    pub bills: BillService,
    pub rate_tables: RateTableService,
    pub tax_summaries: TaxSummaryService,
    pub rate_table_repo: Arc<dyn RateTableRepository>,
}

impl AppState {
    pub fn new(
        config: FiscalConfig,
        db: Option<MongoDb>,
        queue: Arc<dyn MessageQueue>,
        invoice_repo: Arc<dyn InvoiceRepository>,
        bill_repo: Arc<dyn BillRepository>,
        rate_table_repo: Arc<dyn RateTableRepository>,
        tax_summary_repo: Arc<dyn TaxSummaryRepository>,
    ) -> Self {
        let invoices = InvoiceService::new(
            invoice_repo.clone(),
            queue.clone(),
            config.queue.invoice_queue.clone(),
        );
        let tax_summaries =
            TaxSummaryService::new(tax_summary_repo, invoice_repo, rate_table_repo.clone());

        Self {
            config,
            db,
            queue,
            invoices,
            bills: BillService::new(bill_repo),
            rate_tables: RateTableService::new(rate_table_repo.clone()),
            tax_summaries,
            rate_table_repo,
        }
    }

    /// State backed by the MongoDB collections named in the config.
    pub fn with_mongo(config: FiscalConfig, db: MongoDb, queue: Arc<dyn MessageQueue>) -> Self {
        let invoice_repo = Arc::new(MongoRepository::new(db.invoices()));
        let bill_repo = Arc::new(MongoRepository::new(db.bills()));
        let rate_table_repo = Arc::new(MongoRepository::new(db.rate_tables()));
        let tax_summary_repo = Arc::new(MongoRepository::new(db.tax_summaries()));

        Self::new(
            config,
            Some(db),
            queue,
            invoice_repo,
            bill_repo,
            rate_table_repo,
            tax_summary_repo,
        )
    }

    /// State backed by process-local repositories and queue.
    pub fn in_memory(config: FiscalConfig, queue: Arc<InMemoryQueue>) -> Self {
        Self::new(
            config,
            None,
            queue,
            Arc::new(InMemoryRepository::<Invoice>::new()),
            Arc::new(InMemoryRepository::<Bill>::new()),
            Arc::new(InMemoryRepository::<RateTable>::new()),
            Arc::new(InMemoryRepository::<TaxSummary>::new()),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    let invoice_routes = Router::new()
        .route(
            "/",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/by-practitioner/:practitioner_id",
            get(handlers::invoices::list_invoices_by_practitioner),
        )
        .route(
            "/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .route("/:id/exists", get(handlers::invoices::invoice_exists))
        .route("/:id/total", get(handlers::invoices::invoice_total));

    let bill_routes = Router::new()
        .route(
            "/",
            get(handlers::bills::list_bills).post(handlers::bills::create_bill),
        )
        .route(
            "/by-practitioner/:practitioner_id",
            get(handlers::bills::list_bills_by_practitioner),
        )
        .route(
            "/:id",
            get(handlers::bills::get_bill)
                .put(handlers::bills::update_bill)
                .delete(handlers::bills::delete_bill),
        )
        .route("/:id/exists", get(handlers::bills::bill_exists))
        .route("/:id/total", get(handlers::bills::bill_total));

    let rate_table_routes = Router::new()
        .route(
            "/",
            get(handlers::rate_tables::list_rate_tables)
                .post(handlers::rate_tables::create_rate_table),
        )
        .route(
            "/by-code/:code",
            get(handlers::rate_tables::get_rate_table_by_code),
        )
        .route(
            "/by-code/:code/exists",
            get(handlers::rate_tables::rate_table_code_exists),
        )
        .route(
            "/:id",
            get(handlers::rate_tables::get_rate_table)
                .put(handlers::rate_tables::update_rate_table)
                .delete(handlers::rate_tables::delete_rate_table),
        )
        .route("/:id/exists", get(handlers::rate_tables::rate_table_exists));

    let tax_summary_routes = Router::new()
        .route(
            "/",
            get(handlers::tax_summaries::list_tax_summaries)
                .post(handlers::tax_summaries::create_tax_summary),
        )
        .route(
            "/compute",
            post(handlers::tax_summaries::compute_tax_summary),
        )
        .route(
            "/by-practitioner/:practitioner_id",
            get(handlers::tax_summaries::list_tax_summaries_by_practitioner),
        )
        .route(
            "/by-practitioner/:practitioner_id/period",
            get(handlers::tax_summaries::get_tax_summary_by_period),
        )
        .route(
            "/:id",
            get(handlers::tax_summaries::get_tax_summary)
                .put(handlers::tax_summaries::update_tax_summary)
                .delete(handlers::tax_summaries::delete_tax_summary),
        )
        .route(
            "/:id/exists",
            get(handlers::tax_summaries::tax_summary_exists),
        );

    let queue_routes = Router::new()
        .route("/send/:queue", post(handlers::queue::send_to_queue))
        .route("/send-topic/:topic", post(handlers::queue::send_to_topic))
        .route("/receive/:queue", get(handlers::queue::receive_from_queue));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .nest("/invoices", invoice_routes)
        .nest("/bills", bill_routes)
        .nest("/rate-tables", rate_table_routes)
        .nest("/tax-summaries", tax_summary_routes)
        .nest("/queue", queue_routes)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}
