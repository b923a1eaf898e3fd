use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{api::materialize_first, error::ApiResult, main_lib::AppState};
use ledgerly_core::goals::{
    GoalDeletion, GoalFilter, GoalOutlook, GoalsOverview, NewSavingsGoal, RolloverBalances,
    SavingsGoal, SavingsGoalUpdate,
};

#[derive(Debug, Deserialize)]
struct GoalsQuery {
    #[serde(default)]
    filter: GoalFilter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteGoalsRequest {
    ids: Vec<String>,
}

async fn goals_overview(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoalsQuery>,
) -> ApiResult<Json<GoalsOverview>> {
    materialize_first(&state, &user_id).await?;
    let overview = state
        .goal_service
        .goals_overview(&user_id, query.filter)
        .await?;
    Ok(Json(overview))
}

async fn create_goal(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(new_goal): Json<NewSavingsGoal>,
) -> ApiResult<(StatusCode, Json<SavingsGoal>)> {
    materialize_first(&state, &user_id).await?;
    let goal = state.goal_service.create_goal(&user_id, new_goal).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_goal(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<SavingsGoalUpdate>,
) -> ApiResult<Json<SavingsGoal>> {
    let goal = state.goal_service.update_goal(&user_id, &id, update).await?;
    Ok(Json(goal))
}

async fn delete_goals(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteGoalsRequest>,
) -> ApiResult<Json<GoalDeletion>> {
    let deletion = state
        .goal_service
        .delete_goals_with_refund(&user_id, request.ids)
        .await?;
    Ok(Json(deletion))
}

async fn goal_outlook(
    Path((user_id, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<GoalOutlook>> {
    materialize_first(&state, &user_id).await?;
    Ok(Json(state.goal_service.goal_outlook(&user_id, &id)?))
}

async fn reallocate(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RolloverBalances>> {
    materialize_first(&state, &user_id).await?;
    let balances = state.goal_service.reallocate_on_new_goal(&user_id).await?;
    Ok(Json(balances))
}

async fn rollover(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RolloverBalances>> {
    materialize_first(&state, &user_id).await?;
    let balances = state.goal_service.rollover(&user_id).await?;
    Ok(Json(balances))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/goals",
            get(goals_overview).post(create_goal),
        )
        .route("/users/{user_id}/goals/delete", post(delete_goals))
        .route("/users/{user_id}/goals/reallocate", post(reallocate))
        .route("/users/{user_id}/goals/{id}", put(update_goal))
        .route("/users/{user_id}/goals/{id}/outlook", get(goal_outlook))
        .route("/users/{user_id}/rollover", post(rollover))
}
