use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use ledgerly_server::{api::app_router, build_state, config::Config};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn build_test_router() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let config = Config {
        db_path: tmp.path().join("test.db").to_string_lossy().into_owned(),
        ..Config::default()
    };
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn income_and_expense_flow_into_summary() {
    let (app, _tmp) = build_test_router().await;

    let (status, income) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/incomes",
        Some(json!({ "date": today(), "amount": 1000, "source": "Salary" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(income["userId"], "u1");

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/expenses",
        Some(json!({ "date": today(), "amount": 250, "name": "Rent", "category": "Housing" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["expense"]["category"], "Housing");
    assert_eq!(outcome["warnings"].as_array().unwrap().len(), 0);

    let (status, summary) = send(&app, Method::GET, "/api/v1/users/u1/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalIncome"].as_f64(), Some(1000.0));
    assert_eq!(summary["totalExpense"].as_f64(), Some(250.0));
    assert_eq!(summary["balance"].as_f64(), Some(750.0));

    // Other users see nothing.
    let (_, other) = send(&app, Method::GET, "/api/v1/users/u2/incomes", None).await;
    assert_eq!(other.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn expense_beyond_month_surplus_is_rejected() {
    let (app, _tmp) = build_test_router().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/expenses",
        Some(json!({ "date": today(), "amount": 10, "name": "Coffee" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(body["message"].as_str().unwrap().contains("Not enough income"));
}

#[tokio::test]
async fn blank_income_source_is_a_bad_request() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/incomes",
        Some(json!({ "date": today(), "amount": 100, "source": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn half_open_range_is_a_bad_request() {
    let (app, _tmp) = build_test_router().await;
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/u1/incomes?start=2026-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_goal_outlook_is_not_found() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/users/u1/goals/missing/outlook",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn recurring_income_materializes_on_read() {
    let (app, _tmp) = build_test_router().await;

    let (status, template) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/recurring-incomes",
        Some(json!({
            "label": "Salary",
            "amount": 3000,
            "frequency": "Monthly",
            "startDate": today(),
            "endDate": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(template["kind"], "income");
    let template_id = template["id"].as_str().unwrap().to_string();

    let (_, templates) = send(&app, Method::GET, "/api/v1/users/u1/recurring-incomes", None).await;
    assert_eq!(templates.as_array().unwrap().len(), 1);
    let (_, expense_templates) =
        send(&app, Method::GET, "/api/v1/users/u1/recurring-expenses", None).await;
    assert_eq!(expense_templates.as_array().unwrap().len(), 0);

    let (status, incomes) = send(&app, Method::GET, "/api/v1/users/u1/incomes", None).await;
    assert_eq!(status, StatusCode::OK);
    let incomes = incomes.as_array().unwrap();
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0]["recurringId"], template_id.as_str());

    // A second read does not duplicate the occurrence.
    let (_, incomes) = send(&app, Method::GET, "/api/v1/users/u1/incomes", None).await;
    assert_eq!(incomes.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/users/u1/recurring-incomes/{}", template_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, incomes) = send(&app, Method::GET, "/api/v1/users/u1/incomes", None).await;
    assert_eq!(incomes.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn expense_over_category_share_raises_budget_warning() {
    let (app, _tmp) = build_test_router().await;
    let today = Utc::now().date_naive();

    send(
        &app,
        Method::POST,
        "/api/v1/users/u1/incomes",
        Some(json!({ "date": today.to_string(), "amount": 1000, "source": "Salary" })),
    )
    .await;

    let (status, budget) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/budgets",
        Some(json!({
            "name": "Household",
            "totalAmount": 100,
            "startDate": (today - Duration::days(1)).to_string(),
            "endDate": (today + Duration::days(30)).to_string(),
            "categories": [{ "category": "Food", "percentage": 50 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = budget["id"].as_str().unwrap().to_string();

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/expenses",
        Some(json!({
            "date": today.to_string(),
            "amount": 80,
            "name": "Groceries",
            "category": "Food"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let warnings = outcome["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "categoryLimitExceeded");
    assert_eq!(warnings[0]["level"], "warning");
    assert_eq!(warnings[0]["budgetId"], budget_id.as_str());

    let (_, budgets) = send(&app, Method::GET, "/api/v1/users/u1/budgets", None).await;
    let budgets = budgets.as_array().unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0]["totalSpent"].as_f64(), Some(80.0));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/users/u1/budgets/{}", budget_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn goals_overview_lists_created_goal() {
    let (app, _tmp) = build_test_router().await;

    let (status, goal) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/goals",
        Some(json!({ "name": "Laptop", "targetAmount": 1200, "deadline": null })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["priority"], "Medium");

    let (status, overview) =
        send(&app, Method::GET, "/api/v1/users/u1/goals?filter=active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["goals"].as_array().unwrap().len(), 1);

    let (_, completed) = send(
        &app,
        Method::GET,
        "/api/v1/users/u1/goals?filter=completed",
        None,
    )
    .await;
    assert_eq!(completed["goals"].as_array().unwrap().len(), 0);

    let (status, deletion) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/goals/delete",
        Some(json!({ "ids": [goal["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deletion["deleted"], 1);
}
