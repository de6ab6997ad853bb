//! Shared setup for fiscal-service HTTP tests.
//!
//! Every test gets its own router over in-memory repositories and an
//! in-memory queue, so no MongoDB or Redis is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use fiscal_service::config::{FiscalConfig, MongoConfig, ObservabilityConfig, QueueConfig};
use fiscal_service::models::{
    Bill, Invoice, InvoiceStatus, PractitionerProfile, RateTable, ServiceTaker, TaxSummary,
};
use fiscal_service::services::{InMemoryQueue, InMemoryRepository, Repository};
use fiscal_service::{build_router, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const INVOICE_QUEUE: &str = "integracao-nf";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub queue: Arc<InMemoryQueue>,
    pub invoices: Arc<InMemoryRepository<Invoice>>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_queue(InMemoryQueue::new(true))
    }

    pub fn with_queue(queue: InMemoryQueue) -> Self {
        let queue = Arc::new(queue);
        let invoices = Arc::new(InMemoryRepository::<Invoice>::new());

        let state = AppState::new(
            test_config(),
            None,
            queue.clone(),
            invoices.clone(),
            Arc::new(InMemoryRepository::<Bill>::new()),
            Arc::new(InMemoryRepository::<RateTable>::new()),
            Arc::new(InMemoryRepository::<TaxSummary>::new()),
        );

        Self {
            router: build_router(state.clone()),
            state,
            queue,
            invoices,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Stores an invoice directly, bypassing the server-stamped issue date.
    pub async fn seed_invoice(&self, invoice: Invoice) {
        self.invoices.insert(&invoice).await.unwrap();
    }

    /// Waits for the spawned publisher to reach the invoice queue.
    pub async fn wait_for_pending(&self, queue: &str, expected: usize) -> bool {
        for _ in 0..50 {
            if self.queue.pending(queue) >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

pub fn test_config() -> FiscalConfig {
    FiscalConfig {
        common: service_core::config::Config { port: 0 },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "fiscal_test".to_string(),
            invoices_collection: "notas_fiscais".to_string(),
            bills_collection: "faturas".to_string(),
            rate_tables_collection: "municipios_aliquota".to_string(),
            tax_summaries_collection: "impostos_resumo".to_string(),
        },
        queue: QueueConfig {
            enabled: true,
            redis_url: "redis://localhost:6379".to_string(),
            invoice_queue: INVOICE_QUEUE.to_string(),
        },
        observability: ObservabilityConfig {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
        seed_rate_tables: false,
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

pub fn practitioner_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reads a decimal field whether it was rendered as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("expected a decimal, got {}", other),
    }
}

pub fn invoice_body(practitioner_id: &str) -> Value {
    json!({
        "number": "NF-2024-001",
        "total_value": "1500.00",
        "jurisdiction_code": "3550308",
        "issuer": {
            "practitioner_id": practitioner_id,
            "name": "Dra. Ana Souza",
            "tax_id": "123.456.789-00",
            "email": "ana@clinica.com.br"
        },
        "payer": {
            "name": "Carlos Lima",
            "tax_id": "987.654.321-00",
            "email": "carlos@example.com",
            "address": "Rua das Flores, 120 - Centro, 01001000",
            "municipality": "São Paulo - SP"
        },
        "services": [
            {
                "description": "Consulta psicológica",
                "quantity": 2,
                "unit_value": "750.00",
                "iss_rate": "5"
            }
        ]
    })
}

pub fn rate_table_body(code: &str, iss_rate: &str) -> Value {
    json!({
        "jurisdiction_code": code,
        "name": format!("Município {}", code),
        "state_code": "SP",
        "iss_rate": iss_rate
    })
}

pub fn invoice_at(
    practitioner_id: &str,
    value: Decimal,
    code: &str,
    issue_date: chrono::DateTime<chrono::Utc>,
) -> Invoice {
    Invoice {
        id: Uuid::new_v4().to_string(),
        number: None,
        issue_date,
        total_value: value,
        status: InvoiceStatus::Authorized,
        jurisdiction_code: Some(code.to_string()),
        service_tax_withheld: false,
        issuer: Some(PractitionerProfile {
            practitioner_id: practitioner_id.to_string(),
            ..Default::default()
        }),
        payer: Some(ServiceTaker::default()),
        services: Vec::new(),
        email_sent: false,
        email_sent_at: None,
    }
}
