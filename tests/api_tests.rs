use serde_json::{json, Value};
use uuid::Uuid;

use expense_tracker_be::expense::filter::{InputPolicy, QueryPolicy};

mod common;
use common::TestApp;

fn strict() -> QueryPolicy {
    QueryPolicy {
        input: InputPolicy::Strict,
        ..Default::default()
    }
}

fn valid_expense() -> Value {
    json!({
        "title": "Morning coffee",
        "amount": "4.50",
        "category": "Food & Dining",
        "date": "2024-03-05",
        "paymentMethod": "Credit Card",
        "tags": ["work"]
    })
}

#[actix_rt::test]
async fn test_list_expenses_requires_token() {
    let app = TestApp::new();

    let response = app.get("/expenses", None).await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_stats_rejects_forged_token() {
    let app = TestApp::new();

    let response = app
        .get("/expenses/stats?year=2024", Some("not.a.jwt"))
        .await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_create_expense_requires_token() {
    let app = TestApp::new();

    let response = app.post("/expenses", &valid_expense(), None).await;

    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_me_requires_token() {
    let app = TestApp::new();

    let response = app.get("/auth/me", None).await;

    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn test_create_expense_rejects_non_positive_amount() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["amount"] = json!("0");

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_create_expense_rejects_sub_cent_amount() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["amount"] = json!("0.001");

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_create_expense_rejects_three_decimal_amount() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["amount"] = json!("12.345");

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_create_expense_rejects_long_title() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["title"] = json!("x".repeat(101));

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_create_expense_blank_title_after_trim() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["title"] = json!("   ");

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_create_recurring_expense_needs_type() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["isRecurring"] = json!(true);

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Recurring type is required"));
}

#[actix_rt::test]
async fn test_create_expense_unknown_category() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["category"] = json!("Gambling");

    let response = app.post("/expenses", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_update_expense_validates_body() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());
    let mut payload = valid_expense();
    payload["amount"] = json!("-3");

    let path = format!("/expenses/{}", Uuid::new_v4());
    let response = app.put(&path, &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_strict_list_rejects_bad_filters() {
    let app = TestApp::with_policy(strict());
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .get(
            "/expenses?page=abc&category=Gambling&startDate=2024-13-01&endDate=2024-12-31",
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Invalid value for: page, category, startDate");
}

#[actix_rt::test]
async fn test_strict_stats_rejects_bad_period() {
    let app = TestApp::with_policy(strict());
    let token = app.token_for(Uuid::new_v4());

    let response = app
        .get("/expenses/stats?year=twenty&month=0", Some(&token))
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid value for: year, month");
}

#[actix_rt::test]
async fn test_register_invalid_email() {
    let app = TestApp::new();

    let payload = json!({
        "name": "New User",
        "email": "not-an-email",
        "password": "password123"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_register_short_password() {
    let app = TestApp::new();

    let payload = json!({
        "name": "New User",
        "email": "new@example.com",
        "password": "12345"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_register_missing_name() {
    let app = TestApp::new();

    let payload = json!({
        "name": "",
        "email": "new@example.com",
        "password": "password123"
    });

    let response = app.post("/auth/register", &payload, None).await;

    assert_eq!(response.status(), 400);
}

#[actix_rt::test]
async fn test_update_profile_validates_name() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());

    let payload = json!({ "name": "n".repeat(51) });

    let response = app.put("/user/profile", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_update_profile_rejects_unsupported_currency() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());

    let payload = json!({
        "name": "Jane",
        "preferences": { "currency": "BTC", "theme": "dark" }
    });

    let response = app.put("/user/profile", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_update_profile_rejects_unknown_theme() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());

    let payload = json!({
        "name": "Jane",
        "preferences": { "currency": "USD", "theme": "sepia" }
    });

    let response = app.put("/user/profile", &payload, Some(&token)).await;

    assert_eq!(response.status(), 400);
}
