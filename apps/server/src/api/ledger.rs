use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    api::materialize_first,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use ledgerly_core::errors::Error as CoreError;
use ledgerly_core::ledger::{
    DateRange, Expense, ExpenseOutcome, ExpenseUpdate, ImportRow, ImportSummary, Income,
    IncomeUpdate, LedgerSummary, NewExpense, NewIncome,
};
use ledgerly_core::recurring::MaterializationReport;
use ledgerly_core::surplus::MonthlySurplus;

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl RangeQuery {
    fn into_range(self) -> ApiResult<Option<DateRange>> {
        match (self.start, self.end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start <= end => Ok(Some(DateRange::new(start, end))),
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "start must not be after end".to_string(),
            )),
            _ => Err(ApiError::BadRequest(
                "start and end must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SurplusQuery {
    year: Option<i32>,
    month: Option<u32>,
}

async fn materialize(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MaterializationReport>> {
    let report = state.recurring_service.materialize(&user_id).await?;
    Ok(Json(report))
}

async fn summary(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<LedgerSummary>> {
    materialize_first(&state, &user_id).await?;
    let summary = state.ledger_service.summary(&user_id)?;
    Ok(Json(summary))
}

async fn monthly_surplus(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SurplusQuery>,
) -> ApiResult<Json<MonthlySurplus>> {
    materialize_first(&state, &user_id).await?;
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    let surplus = state.surplus_service.monthly_surplus(&user_id, year, month)?;
    Ok(Json(MonthlySurplus {
        year,
        month,
        surplus,
    }))
}

async fn list_incomes(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<Income>>> {
    let range = query.into_range()?;
    materialize_first(&state, &user_id).await?;
    Ok(Json(state.ledger_service.get_incomes(&user_id, range)?))
}

async fn create_income(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_income): Json<NewIncome>,
) -> ApiResult<(StatusCode, Json<Income>)> {
    let income = state.ledger_service.add_income(&user_id, new_income).await?;
    Ok((StatusCode::CREATED, Json(income)))
}

async fn update_income(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<IncomeUpdate>,
) -> ApiResult<Json<Income>> {
    let income = state
        .ledger_service
        .update_income(&user_id, &id, update)
        .await?;
    Ok(Json(income))
}

async fn delete_income(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .ledger_service
        .delete_incomes(&user_id, vec![id.clone()])
        .await?;
    if deleted == 0 {
        return Err(CoreError::NotFound(format!("Income {} not found", id)).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_expenses(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<Expense>>> {
    let range = query.into_range()?;
    materialize_first(&state, &user_id).await?;
    Ok(Json(state.ledger_service.get_expenses(&user_id, range)?))
}

async fn create_expense(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_expense): Json<NewExpense>,
) -> ApiResult<(StatusCode, Json<ExpenseOutcome>)> {
    let outcome = state
        .ledger_service
        .add_expense(&user_id, new_expense)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn update_expense(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ExpenseUpdate>,
) -> ApiResult<Json<ExpenseOutcome>> {
    let outcome = state
        .ledger_service
        .update_expense(&user_id, &id, update)
        .await?;
    Ok(Json(outcome))
}

async fn delete_expense(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .ledger_service
        .delete_expenses(&user_id, vec![id.clone()])
        .await?;
    if deleted == 0 {
        return Err(CoreError::NotFound(format!("Expense {} not found", id)).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn import_entries(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<ImportRow>>,
) -> ApiResult<Json<ImportSummary>> {
    let summary = state.ledger_service.import_entries(&user_id, rows).await?;
    Ok(Json(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{user_id}/materialize", post(materialize))
        .route("/users/{user_id}/summary", get(summary))
        .route("/users/{user_id}/surplus", get(monthly_surplus))
        .route(
            "/users/{user_id}/incomes",
            get(list_incomes).post(create_income),
        )
        .route(
            "/users/{user_id}/incomes/{id}",
            put(update_income).delete(delete_income),
        )
        .route(
            "/users/{user_id}/expenses",
            get(list_expenses).post(create_expense),
        )
        .route(
            "/users/{user_id}/expenses/{id}",
            put(update_expense).delete(delete_expense),
        )
        .route("/users/{user_id}/entries/import", post(import_entries))
}
