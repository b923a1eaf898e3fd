use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};
use ledgerly_core::investments::{
    Investment, InvestmentUpdate, InvestmentValuation, NewInvestment,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    refreshed: bool,
}

async fn list_investments(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<InvestmentValuation>>> {
    Ok(Json(state.investment_service.get_investments(&user_id)?))
}

async fn create_investment(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_investment): Json<NewInvestment>,
) -> ApiResult<(StatusCode, Json<Investment>)> {
    let investment = state
        .investment_service
        .create_investment(&user_id, new_investment)
        .await?;
    Ok((StatusCode::CREATED, Json(investment)))
}

async fn update_investment(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<InvestmentUpdate>,
) -> ApiResult<Json<Investment>> {
    let investment = state
        .investment_service
        .update_investment(&user_id, &id, update)
        .await?;
    Ok(Json(investment))
}

async fn delete_investment(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state
        .investment_service
        .delete_investment(&user_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_investment(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RefreshResponse>> {
    let refreshed = state
        .investment_service
        .refresh_if_stale(&user_id, &id)
        .await?;
    Ok(Json(RefreshResponse { refreshed }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/investments",
            get(list_investments).post(create_investment),
        )
        .route(
            "/users/{user_id}/investments/{id}",
            put(update_investment).delete(delete_investment),
        )
        .route(
            "/users/{user_id}/investments/{id}/refresh",
            post(refresh_investment),
        )
}
