use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::{error::ApiResult, main_lib::AppState};
use ledgerly_core::ledger::EntryKind;
use ledgerly_core::recurring::{NewRecurringTemplate, RecurringTemplate, RecurringTemplateUpdate};

fn list_templates(
    state: &AppState,
    user_id: &str,
    kind: EntryKind,
) -> ApiResult<Json<Vec<RecurringTemplate>>> {
    let templates = state.recurring_service.get_templates(user_id, Some(kind))?;
    Ok(Json(templates))
}

async fn create_template(
    state: &AppState,
    user_id: &str,
    kind: EntryKind,
    new_template: NewRecurringTemplate,
) -> ApiResult<(StatusCode, Json<RecurringTemplate>)> {
    let template = state
        .recurring_service
        .create_template(user_id, kind, new_template)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    state: &AppState,
    user_id: &str,
    kind: EntryKind,
    id: &str,
    update: RecurringTemplateUpdate,
) -> ApiResult<Json<RecurringTemplate>> {
    let template = state
        .recurring_service
        .update_template(user_id, kind, id, update)
        .await?;
    Ok(Json(template))
}

async fn delete_template(
    state: &AppState,
    user_id: &str,
    kind: EntryKind,
    id: &str,
) -> ApiResult<StatusCode> {
    state
        .recurring_service
        .delete_template(user_id, kind, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_recurring_incomes(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<RecurringTemplate>>> {
    list_templates(&state, &user_id, EntryKind::Income)
}

async fn create_recurring_income(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_template): Json<NewRecurringTemplate>,
) -> ApiResult<(StatusCode, Json<RecurringTemplate>)> {
    create_template(&state, &user_id, EntryKind::Income, new_template).await
}

async fn update_recurring_income(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<RecurringTemplateUpdate>,
) -> ApiResult<Json<RecurringTemplate>> {
    update_template(&state, &user_id, EntryKind::Income, &id, update).await
}

async fn delete_recurring_income(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    delete_template(&state, &user_id, EntryKind::Income, &id).await
}

async fn list_recurring_expenses(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<RecurringTemplate>>> {
    list_templates(&state, &user_id, EntryKind::Expense)
}

async fn create_recurring_expense(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_template): Json<NewRecurringTemplate>,
) -> ApiResult<(StatusCode, Json<RecurringTemplate>)> {
    create_template(&state, &user_id, EntryKind::Expense, new_template).await
}

async fn update_recurring_expense(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<RecurringTemplateUpdate>,
) -> ApiResult<Json<RecurringTemplate>> {
    update_template(&state, &user_id, EntryKind::Expense, &id, update).await
}

async fn delete_recurring_expense(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    delete_template(&state, &user_id, EntryKind::Expense, &id).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/recurring-incomes",
            get(list_recurring_incomes).post(create_recurring_income),
        )
        .route(
            "/users/{user_id}/recurring-incomes/{id}",
            put(update_recurring_income).delete(delete_recurring_income),
        )
        .route(
            "/users/{user_id}/recurring-expenses",
            get(list_recurring_expenses).post(create_recurring_expense),
        )
        .route(
            "/users/{user_id}/recurring-expenses/{id}",
            put(update_recurring_expense).delete(delete_recurring_expense),
        )
}
