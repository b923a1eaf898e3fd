//! Investments module - investment records, valuation, ledger sync, services, and traits.

mod investments_model;
mod investments_service;
mod investments_traits;
mod sync;
mod valuation;


pub use investments_model::{
    Investment, InvestmentStatus, InvestmentUpdate, InvestmentValuation, NewInvestment,
};
pub use investments_service::InvestmentService;
pub use investments_traits::{InvestmentRepositoryTrait, InvestmentServiceTrait, RateProvider};
pub use sync::plan_investment_sync;
pub use valuation::{default_frequency, estimated_value, maturity_income_category};
