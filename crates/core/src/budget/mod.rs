//! Budget module - percentage budgets, spend warnings, services, and traits.

mod budget_model;
mod budget_service;
mod budget_traits;

#[cfg(test)]
mod budget_service_tests;

pub use budget_model::{
    Budget, BudgetCategory, BudgetStatus, BudgetWarning, BudgetWarningKind, CategorySpending,
    NewBudget, NewBudgetCategory, WarningLevel,
};
pub use budget_service::BudgetService;
pub use budget_traits::{BudgetRepositoryTrait, BudgetServiceTrait, NotificationSink};
