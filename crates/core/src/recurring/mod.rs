//! Recurring module - templates, the materialization engine, services, and traits.

mod materializer;
mod recurring_model;
mod recurring_service;
mod recurring_traits;


pub use materializer::{MaterializationInput, Materializer};
pub use recurring_model::{
    Frequency, MaterializationPlan, MaterializationReport, NewRecurringTemplate,
    RecurringStatus, RecurringTemplate, RecurringTemplateUpdate, TemplateChange,
};
pub use recurring_service::RecurringService;
pub use recurring_traits::{RecurringRepositoryTrait, RecurringServiceTrait};
