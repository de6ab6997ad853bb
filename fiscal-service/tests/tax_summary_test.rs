mod common;

use axum::http::StatusCode;
use chrono::{Datelike, TimeZone, Utc};
use common::{decimal, invoice_at, practitioner_id, rate_table_body, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn seed_march_2024(app: &TestApp, pid: &str) {
    app.post("/rate-tables", rate_table_body("A", "5")).await;
    app.post("/rate-tables", rate_table_body("B", "3")).await;

    let march_5 = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
    let march_28 = Utc.with_ymd_and_hms(2024, 3, 28, 18, 30, 0).unwrap();
    app.seed_invoice(invoice_at(pid, dec!(1000), "A", march_5))
        .await;
    app.seed_invoice(invoice_at(pid, dec!(2000), "B", march_28))
        .await;
}

fn compute_uri(pid: &str, month: i32, year: i32) -> String {
    format!(
        "/tax-summaries/compute?practitioner_id={}&month={}&year={}",
        pid, month, year
    )
}

fn summary_body(pid: &str, month: i32, year: i32) -> Value {
    json!({
        "practitioner_id": pid,
        "month": month,
        "year": year,
        "gross_revenue": "1000",
        "iss_total": "50",
        "pis_total": "6.5",
        "invoice_count": 1
    })
}

#[tokio::test]
async fn compute_aggregates_march_invoices() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    seed_march_2024(&app, &pid).await;

    let response = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    let summary = &response.body;
    assert_eq!(decimal(&summary["gross_revenue"]), dec!(3000));
    assert_eq!(decimal(&summary["iss_total"]), dec!(110));
    for category in ["irpj_total", "csll_total", "pis_total", "cofins_total", "inss_total"] {
        assert_eq!(decimal(&summary[category]), Decimal::ZERO, "{}", category);
    }
    assert_eq!(decimal(&summary["total_taxes"]), dec!(110));
    assert_eq!(decimal(&summary["net_revenue"]), dec!(2890));
    assert_eq!(summary["invoice_count"], 2);
    assert_eq!(summary["month"], 3);
    assert_eq!(summary["year"], 2024);
}

#[tokio::test]
async fn compute_ignores_other_months_and_practitioners() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    seed_march_2024(&app, &pid).await;

    let april = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let february = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    let march = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
    app.seed_invoice(invoice_at(&pid, dec!(500), "A", april)).await;
    app.seed_invoice(invoice_at(&pid, dec!(700), "A", february)).await;
    app.seed_invoice(invoice_at(&practitioner_id(), dec!(900), "A", march))
        .await;

    let response = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(decimal(&response.body["gross_revenue"]), dec!(3000));
    assert_eq!(response.body["invoice_count"], 2);
}

#[tokio::test]
async fn missing_rate_table_contributes_no_tax() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    app.post("/rate-tables", rate_table_body("A", "5")).await;
    let day = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    app.seed_invoice(invoice_at(&pid, dec!(1000), "A", day)).await;
    app.seed_invoice(invoice_at(&pid, dec!(400), "UNKNOWN", day)).await;

    let response = app.post(&compute_uri(&pid, 6, 2024), json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(decimal(&response.body["gross_revenue"]), dec!(1400));
    assert_eq!(decimal(&response.body["iss_total"]), dec!(50));
    assert_eq!(decimal(&response.body["net_revenue"]), dec!(1350));
    assert_eq!(response.body["invoice_count"], 2);
}

#[tokio::test]
async fn recompute_overwrites_the_same_summary() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    seed_march_2024(&app, &pid).await;

    let first = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;
    let late = Utc.with_ymd_and_hms(2024, 3, 31, 23, 0, 0).unwrap();
    app.seed_invoice(invoice_at(&pid, dec!(1000), "A", late)).await;
    let second = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;

    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["id"], second.body["id"]);
    assert_eq!(decimal(&second.body["gross_revenue"]), dec!(4000));
    assert_eq!(second.body["invoice_count"], 3);

    let listed = app
        .get(&format!("/tax-summaries/by-practitioner/{}", pid))
        .await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let by_period = app
        .get(&format!(
            "/tax-summaries/by-practitioner/{}/period?month=3&year=2024",
            pid
        ))
        .await;
    assert_eq!(by_period.status, StatusCode::OK);
    assert_eq!(by_period.body["id"], first.body["id"]);
}

#[tokio::test]
async fn compute_without_invoices_is_not_found() {
    let app = TestApp::spawn();
    let pid = practitioner_id();

    let response = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(app.get("/tax-summaries").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn compute_rejects_out_of_range_periods() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    seed_march_2024(&app, &pid).await;
    let too_late = Utc::now().year() + 2;

    for (month, year) in [(0, 2024), (13, 2024), (3, 1999), (3, too_late)] {
        let response = app.post(&compute_uri(&pid, month, year), json!({})).await;
        assert_eq!(
            response.status,
            StatusCode::BAD_REQUEST,
            "month={} year={}",
            month,
            year
        );
    }

    let bad_practitioner = app.post(&compute_uri("nobody", 3, 2024), json!({})).await;
    assert_eq!(bad_practitioner.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn direct_create_rejects_out_of_range_periods() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    let too_late = Utc::now().year() + 2;

    for (month, year) in [(0, 2024), (13, 2024), (3, 1999), (3, too_late)] {
        let response = app
            .post("/tax-summaries", summary_body(&pid, month, year))
            .await;
        assert_eq!(
            response.status,
            StatusCode::BAD_REQUEST,
            "month={} year={}",
            month,
            year
        );
    }
}

#[tokio::test]
async fn direct_create_derives_totals_and_guards_the_period() {
    let app = TestApp::spawn();
    let pid = practitioner_id();

    let created = app.post("/tax-summaries", summary_body(&pid, 5, 2024)).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(decimal(&created.body["total_taxes"]), dec!(56.5));
    assert_eq!(decimal(&created.body["net_revenue"]), dec!(943.5));
    assert!(!created.body["calculated_at"].as_str().unwrap().is_empty());

    let id = created.body["id"].as_str().unwrap();
    let read = app.get(&format!("/tax-summaries/{}", id)).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["practitioner_id"], pid);

    let duplicate = app.post("/tax-summaries", summary_body(&pid, 5, 2024)).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_cannot_move_onto_an_existing_period() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    app.post("/tax-summaries", summary_body(&pid, 1, 2024)).await;
    let february = app.post("/tax-summaries", summary_body(&pid, 2, 2024)).await;
    let id = february.body["id"].as_str().unwrap();

    let clash = app
        .put(&format!("/tax-summaries/{}", id), summary_body(&pid, 1, 2024))
        .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);

    let mut body = summary_body(&pid, 2, 2024);
    body["gross_revenue"] = json!("2000");
    let updated = app.put(&format!("/tax-summaries/{}", id), body).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(decimal(&updated.body["net_revenue"]), dec!(1943.5));
}

#[tokio::test]
async fn delete_missing_summary_is_not_found() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    let created = app.post("/tax-summaries", summary_body(&pid, 7, 2024)).await;
    let id = created.body["id"].as_str().unwrap();

    assert_eq!(
        app.delete(&format!("/tax-summaries/{}", id)).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.delete(&format!("/tax-summaries/{}", id)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("/tax-summaries/{}/exists", id)).await.body,
        json!({ "exists": false })
    );

    let period = app
        .get(&format!(
            "/tax-summaries/by-practitioner/{}/period?month=7&year=2024",
            pid
        ))
        .await;
    assert_eq!(period.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compute_rejects_totals_beyond_decimal_range() {
    let app = TestApp::spawn();
    let pid = practitioner_id();
    let huge = dec!(50000000000000000000000000000);
    let march_5 = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
    let march_6 = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
    app.seed_invoice(invoice_at(&pid, huge, "A", march_5)).await;
    app.seed_invoice(invoice_at(&pid, huge, "A", march_6)).await;

    let response = app.post(&compute_uri(&pid, 3, 2024), json!({})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let stored = app
        .get(&format!(
            "/tax-summaries/by-practitioner/{}/period?month=3&year=2024",
            pid
        ))
        .await;
    assert_eq!(stored.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn direct_create_rejects_overflowing_category_totals() {
    let app = TestApp::spawn();
    let mut body = summary_body(&practitioner_id(), 3, 2024);
    body["iss_total"] = json!(Decimal::MAX.to_string());
    body["irpj_total"] = json!(Decimal::MAX.to_string());

    let response = app.post("/tax-summaries", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
