//! Debt creation and payment integration tests.

mod common;

use axum::http::StatusCode;
use common::{debt_body, decimal, usd, uuid, TestHarness};
use kassa_core::DebtId;
use kassa_store::Store;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn sales_of(harness: &TestHarness, debt_id: &str) -> usize {
    let id: DebtId = debt_id.parse().expect("debt id");
    harness.store.list_sales_by_debt(&id).expect("sales").len()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_debt_starts_pending() {
    let harness = TestHarness::new();
    let store_id = harness.register_store("Main").await;

    let response = harness
        .server
        .post("/v1/debts")
        .json(&debt_body(None, &store_id, 100, 2))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["debt"]["status"], "pending");
    assert_eq!(decimal(&body["debt"]["remainingAmount"]), dec!(100));
    assert_eq!(body["debt"]["paymentMethod"], "credit");
}

#[tokio::test]
async fn create_debt_requires_store() {
    let harness = TestHarness::new();
    let mut body = debt_body(None, &uuid(), 100, 1);
    body.as_object_mut().expect("object").remove("storeId");

    let response = harness.server.post("/v1/debts").json(&body).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "missing_field");
}

#[tokio::test]
async fn create_debt_rejects_negative_total() {
    let harness = TestHarness::new();
    let mut body = debt_body(None, &uuid(), 10, 1);
    body["totalAmount"] = json!(-5);

    let response = harness.server.post("/v1/debts").json(&body).await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "invalid_amount");
}

#[tokio::test]
async fn initial_payment_is_converted() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let mut body = debt_body(None, &store_id, 100, 1);
    body["paymentHistory"] = json!([{ "amount": 125_000, "currency": "SUM" }]);

    let response = harness.server.post("/v1/debts").json(&body).await;

    response.assert_status(StatusCode::CREATED);
    let debt = &response.json::<Value>()["debt"];
    assert_eq!(decimal(&debt["remainingAmount"]), dec!(90));
    assert_eq!(debt["paymentHistory"][0]["storeId"], store_id.as_str());
    assert_eq!(debt["paymentHistory"][0]["type"], "cash");
}

#[tokio::test]
async fn local_initial_payment_without_rate_fails() {
    let harness = TestHarness::new();
    let store_id = harness.register_store("Main").await;
    let mut body = debt_body(None, &store_id, 100, 1);
    body["paymentHistory"] = json!([{ "amount": 1000, "currency": "KGS" }]);

    let response = harness.server.post("/v1/debts").json(&body).await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "no_rate_available");
}

#[tokio::test]
async fn debt_created_fully_paid_materializes_sales() {
    let harness = TestHarness::new();
    let store_id = harness.register_store("Main").await;
    let mut body = debt_body(None, &store_id, 50, 2);
    body["paymentHistory"] = json!([{ "amount": 50, "currency": "USD" }]);

    let response = harness.server.post("/v1/debts").json(&body).await;

    response.assert_status(StatusCode::CREATED);
    let debt = &response.json::<Value>()["debt"];
    assert_eq!(debt["status"], "paid");
    assert_eq!(sales_of(&harness, debt["id"].as_str().expect("id")), 2);
}

// ============================================================================
// Pay
// ============================================================================

#[tokio::test]
async fn partial_then_final_payment_settles() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 100, 3).await;

    let response = harness.pay(&debt_id, usd(60, &store_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(decimal(&body["remainingAmount"]), dec!(40));
    assert_eq!(body["status"], "pending");
    assert_eq!(sales_of(&harness, &debt_id), 0);

    let response = harness.pay(&debt_id, usd(40, &store_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(decimal(&body["remainingAmount"]), dec!(0));
    assert_eq!(body["status"], "paid");
    assert_eq!(body["paymentHistory"].as_array().map(Vec::len), Some(2));
    assert_eq!(sales_of(&harness, &debt_id), 3);
}

#[tokio::test]
async fn overpayment_clamps_at_zero() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 30, 1).await;

    let response = harness.pay(&debt_id, usd(45, &store_id)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(decimal(&body["remainingAmount"]), dec!(0));
    assert_eq!(body["status"], "paid");
}

#[tokio::test]
async fn local_currency_payment_is_converted() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 100, 1).await;

    let response = harness
        .pay(
            &debt_id,
            json!({ "amount": 250_000, "currency": "SUM", "storeId": store_id }),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(decimal(&body["remainingAmount"]), dec!(80));
    assert_eq!(body["paymentHistory"][0]["currency"], "SUM");
    assert_eq!(decimal(&body["paymentHistory"][0]["amount"]), dec!(250000));
}

#[tokio::test]
async fn payment_on_settled_debt_conflicts() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 10, 2).await;
    harness.pay(&debt_id, usd(10, &store_id)).await.assert_status_ok();

    let response = harness.pay(&debt_id, usd(5, &store_id)).await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "debt_already_settled"
    );
    assert_eq!(sales_of(&harness, &debt_id), 2);
}

#[tokio::test]
async fn unknown_currency_changes_nothing() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 100, 1).await;

    let response = harness
        .pay(
            &debt_id,
            json!({ "amount": 10, "currency": "EUR", "storeId": store_id }),
        )
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "invalid_currency");

    let id: DebtId = debt_id.parse().expect("debt id");
    let debt = harness.store.get_debt(&id).expect("get").expect("debt");
    assert_eq!(debt.remaining_amount(), dec!(100));
    assert!(debt.payment_history().is_empty());
}

#[tokio::test]
async fn payment_overflowing_history_changes_nothing() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let mut body = debt_body(None, &store_id, 100, 1);
    body["totalAmount"] = json!("70000000000000000000000000000");
    let response = harness.server.post("/v1/debts").json(&body).await;
    let debt_id = common::id_of(&response.json::<Value>()["debt"]);
    let huge = json!({
        "amount": "50000000000000000000000000000",
        "currency": "USD",
        "storeId": store_id
    });

    harness.pay(&debt_id, huge.clone()).await.assert_status_ok();
    let response = harness.pay(&debt_id, huge).await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "invalid_amount");
    let id: DebtId = debt_id.parse().expect("debt id");
    let debt = harness.store.get_debt(&id).expect("get").expect("debt");
    assert_eq!(debt.payment_history().len(), 1);
    assert_eq!(
        debt.remaining_amount(),
        dec!(20000000000000000000000000000)
    );
}

#[tokio::test]
async fn payment_without_rate_fails() {
    let harness = TestHarness::new();
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 100, 1).await;

    let response = harness.pay(&debt_id, usd(10, &store_id)).await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["code"], "no_rate_available");
}

#[tokio::test]
async fn payment_validation_errors() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let debt_id = harness.create_debt(None, &store_id, 100, 1).await;

    let cases = [
        (json!({ "amount": 10, "currency": "USD" }), "missing_field"),
        (
            json!({ "amount": 0, "currency": "USD", "storeId": store_id }),
            "invalid_amount",
        ),
        (
            json!({ "amount": -3, "currency": "USD", "storeId": store_id }),
            "invalid_amount",
        ),
        (json!({ "amount": "abc", "storeId": store_id }), "bad_request"),
    ];

    for (body, code) in cases {
        let response = harness.pay(&debt_id, body).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"]["code"], code);
    }
}

#[tokio::test]
async fn unknown_debt_is_not_found() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;

    let response = harness
        .pay(&DebtId::generate().to_string(), usd(10, &uuid()))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn pay_by_client_phone() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let client_id = harness
        .register_client("Aziz", "+998901234567", Some("Chilonzor 5"))
        .await;
    let debt_id = harness.create_debt(Some(&client_id), &store_id, 20, 1).await;

    let response = harness.pay("+998901234567", usd(20, &store_id)).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["debtId"], debt_id.as_str());
    assert_eq!(body["status"], "paid");

    let id: DebtId = debt_id.parse().expect("debt id");
    let sales = harness.store.list_sales_by_debt(&id).expect("sales");
    assert_eq!(sales[0].client_address, "Chilonzor 5");
}

#[tokio::test]
async fn unknown_phone_is_not_found() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;

    let response = harness.pay("+998900000000", usd(10, &uuid())).await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn phone_without_pending_debt_is_not_found() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let client_id = harness.register_client("Aziz", "555-01", None).await;
    let debt_id = harness.create_debt(Some(&client_id), &store_id, 5, 1).await;
    harness.pay(&debt_id, usd(5, &store_id)).await.assert_status_ok();

    let response = harness.pay("555-01", usd(5, &store_id)).await;

    response.assert_status_not_found();
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn client_debts_resolve_stores() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Bazaar").await;
    let client_id = harness.register_client("Aziz", "555-02", None).await;
    let debt_id = harness.create_debt(Some(&client_id), &store_id, 100, 2).await;
    harness.pay(&debt_id, usd(10, &store_id)).await.assert_status_ok();
    harness.create_debt(None, &store_id, 7, 1).await;

    let response = harness
        .server
        .get(&format!("/v1/debts/client/{client_id}"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let debts = body.as_array().expect("array");
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0]["products"].as_array().map(Vec::len), Some(2));
    assert_eq!(debts[0]["paymentHistory"][0]["store"]["name"], "Bazaar");
}

#[tokio::test]
async fn client_debts_with_bad_id_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/debts/client/not-an-id").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn debtors_lists_pending_lines_newest_first() {
    let harness = TestHarness::new();
    harness.set_rate(12_500, 89).await;
    let store_id = harness.register_store("Main").await;
    let client_id = harness.register_client("Aziz", "555-03", Some("Yunusobod")).await;

    let older = harness.create_debt(Some(&client_id), &store_id, 100, 2).await;
    let settled = harness.create_debt(None, &store_id, 10, 1).await;
    harness.pay(&settled, usd(10, &store_id)).await.assert_status_ok();
    let newer = harness.create_debt(None, &store_id, 30, 1).await;

    let response = harness.server.get("/v1/debts/debtors").await;

    response.assert_status_ok();
    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["debtId"], newer.as_str());
    assert_eq!(rows[1]["debtId"], older.as_str());
    assert_eq!(rows[1]["client"]["phone"], "555-03");
    assert!(rows[1]["id"]
        .as_str()
        .expect("row id")
        .starts_with(&format!("{older}_")));
    assert_eq!(decimal(&rows[2]["remainingAmount"]), dec!(100));
}
