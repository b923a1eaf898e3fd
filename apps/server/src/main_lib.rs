use std::sync::Arc;

use crate::collaborators::{
    ConfiguredRateProvider, KeywordClassifier, LinearPacePredictor, LoggingNotificationSink,
};
use crate::config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use ledgerly_core::{
    budget::{BudgetService, BudgetServiceTrait},
    goals::{GoalService, GoalServiceTrait},
    investments::{InvestmentService, InvestmentServiceTrait},
    ledger::{LedgerService, LedgerServiceTrait},
    recurring::{RecurringService, RecurringServiceTrait},
    surplus::{SurplusService, SurplusServiceTrait},
    utils::{Clock, SystemClock, UserLocks},
};
use ledgerly_storage_sqlite::{
    db, BudgetRepository, GoalRepository, InvestmentRepository, LedgerRepository,
    RecurringRepository,
};

pub struct AppState {
    pub ledger_service: Arc<dyn LedgerServiceTrait>,
    pub recurring_service: Arc<dyn RecurringServiceTrait>,
    pub surplus_service: Arc<dyn SurplusServiceTrait>,
    pub goal_service: Arc<dyn GoalServiceTrait>,
    pub budget_service: Arc<dyn BudgetServiceTrait>,
    pub investment_service: Arc<dyn InvestmentServiceTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("LG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `try_init` also bridges `log` records from the library crates.
    let installed = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let (pool, writer) = db::open(&config.db_path)?;
    let db_path = db::get_db_path(&config.db_path);
    tracing::info!("Database path in use: {}", db_path);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    // Shared so materialization and allocation for one user never interleave.
    let locks = Arc::new(UserLocks::new());

    let ledger_repository = Arc::new(LedgerRepository::new(pool.clone(), writer.clone()));
    let recurring_repository = Arc::new(RecurringRepository::new(pool.clone(), writer.clone()));
    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer.clone()));
    let budget_repository = Arc::new(BudgetRepository::new(pool.clone(), writer.clone()));
    let investment_repository = Arc::new(InvestmentRepository::new(pool.clone(), writer.clone()));

    let classifier = Arc::new(KeywordClassifier);
    let notifier = Arc::new(LoggingNotificationSink);
    let rate_provider = Arc::new(ConfiguredRateProvider::from_pairs(&config.expected_returns));

    let surplus_service: Arc<dyn SurplusServiceTrait> =
        Arc::new(SurplusService::new(ledger_repository.clone()));

    let recurring_service: Arc<dyn RecurringServiceTrait> = Arc::new(RecurringService::new(
        recurring_repository.clone(),
        ledger_repository.clone(),
        classifier.clone(),
        clock.clone(),
        locks.clone(),
    ));

    let budget_service: Arc<dyn BudgetServiceTrait> = Arc::new(BudgetService::new(
        budget_repository,
        ledger_repository.clone(),
        notifier,
        clock.clone(),
    ));

    let ledger_service: Arc<dyn LedgerServiceTrait> = Arc::new(LedgerService::new(
        ledger_repository.clone(),
        recurring_repository,
        surplus_service.clone(),
        budget_service.clone(),
        classifier,
        clock.clone(),
    ));

    let predictor = Arc::new(LinearPacePredictor::new(surplus_service.clone()));
    let goal_service: Arc<dyn GoalServiceTrait> = Arc::new(GoalService::new(
        goal_repository,
        surplus_service.clone(),
        predictor,
        clock.clone(),
        locks,
    ));

    let investment_service: Arc<dyn InvestmentServiceTrait> = Arc::new(InvestmentService::new(
        investment_repository,
        ledger_repository,
        rate_provider,
        clock,
    ));

    Ok(Arc::new(AppState {
        ledger_service,
        recurring_service,
        surplus_service,
        goal_service,
        budget_service,
        investment_service,
        db_path,
    }))
}
