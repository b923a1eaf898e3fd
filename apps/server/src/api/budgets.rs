use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::{api::materialize_first, error::ApiResult, main_lib::AppState};
use ledgerly_core::budget::{Budget, BudgetStatus, NewBudget};

async fn list_budgets(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BudgetStatus>>> {
    materialize_first(&state, &user_id).await?;
    Ok(Json(state.budget_service.get_budgets(&user_id)?))
}

async fn create_budget(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_budget): Json<NewBudget>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    let budget = state
        .budget_service
        .create_budget(&user_id, new_budget)
        .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

async fn delete_budget(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.budget_service.delete_budget(&user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/budgets",
            get(list_budgets).post(create_budget),
        )
        .route("/users/{user_id}/budgets/{id}", delete(delete_budget))
}
