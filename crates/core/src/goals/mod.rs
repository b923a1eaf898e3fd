//! Goals module - savings goals, surplus allocation, services, and traits.

mod allocation;
mod goals_model;
mod goals_service;
mod goals_traits;


pub use allocation::{allocate, funding_order, reallocation_candidates, rollover_candidates};
pub use goals_model::{
    AllocationResult, GoalDeletion, GoalFilter, GoalOutlook, GoalPrediction, GoalPriority,
    GoalsOverview, NewSavingsGoal, OutlookDeadline, OutlookProbability, RolloverBalances,
    SavingsGoal, SavingsGoalUpdate, SurplusTracker,
};
pub use goals_service::GoalService;
pub use goals_traits::{GoalProbabilityPredictor, GoalRepositoryTrait, GoalServiceTrait};
