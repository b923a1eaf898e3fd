//! Priority-ordered distribution of a surplus pool over savings goals.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::goals_model::{AllocationResult, SavingsGoal};

/// Funding order: earliest deadline, then priority, then age, then id.
/// A goal without a deadline sorts after every dated goal.
pub fn funding_order(a: &SavingsGoal, b: &SavingsGoal) -> Ordering {
    let deadline = |g: &SavingsGoal| g.deadline.unwrap_or(NaiveDate::MAX);
    deadline(a)
        .cmp(&deadline(b))
        .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Goals a month-start rollover funds: dated goals whose deadline has not passed.
pub fn rollover_candidates(goals: &[SavingsGoal], today: NaiveDate) -> Vec<&SavingsGoal> {
    let mut eligible: Vec<&SavingsGoal> = goals
        .iter()
        .filter(|g| g.deadline.is_some_and(|d| d >= today))
        .collect();
    eligible.sort_by(|a, b| funding_order(a, b));
    eligible
}

/// Goals a reallocation funds: every goal, undated ones last.
pub fn reallocation_candidates(goals: &[SavingsGoal]) -> Vec<&SavingsGoal> {
    let mut ordered: Vec<&SavingsGoal> = goals.iter().collect();
    ordered.sort_by(|a, b| funding_order(a, b));
    ordered
}

/// Fills goals in order, each up to its target, until the pool runs dry.
pub fn allocate(ordered: &[&SavingsGoal], pool: Decimal) -> AllocationResult {
    let mut remaining = pool.max(Decimal::ZERO);
    let mut allocations = Vec::new();
    for goal in ordered {
        if remaining <= Decimal::ZERO {
            break;
        }
        let amount = remaining.min(goal.target_amount);
        allocations.push((goal.id.clone(), amount));
        remaining -= amount;
    }
    AllocationResult {
        allocations,
        leftover: remaining,
    }
}
