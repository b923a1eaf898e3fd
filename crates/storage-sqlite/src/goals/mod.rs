//! SQLite storage implementation for savings goals and the surplus tracker.

mod model;
mod repository;

pub use model::{SavingsGoalDB, SurplusTrackerDB};
pub use repository::GoalRepository;
