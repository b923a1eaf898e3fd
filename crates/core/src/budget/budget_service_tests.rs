use super::*;
use crate::errors::{Error, ValidationError};
use crate::testing::{InMemoryBudgets, InMemoryLedger, RecordingNotifier};
use crate::utils::FixedClock;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn fixture(notifier: RecordingNotifier) -> (Arc<InMemoryLedger>, Arc<RecordingNotifier>, BudgetService) {
    let ledger = Arc::new(InMemoryLedger::new());
    let notifier = Arc::new(notifier);
    let service = BudgetService::new(
        Arc::new(InMemoryBudgets::new()),
        ledger.clone(),
        notifier.clone(),
        Arc::new(FixedClock::at_date(d(2026, 3, 15))),
    );
    (ledger, notifier, service)
}

fn march_budget(categories: &[(&str, Decimal)]) -> NewBudget {
    NewBudget {
        id: Some("march".to_string()),
        name: "March".to_string(),
        total_amount: dec!(1000),
        start_date: d(2026, 3, 1),
        end_date: d(2026, 3, 31),
        categories: categories
            .iter()
            .map(|(category, percentage)| NewBudgetCategory {
                category: category.to_string(),
                percentage: *percentage,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_create_budget_rejects_over_allotted_categories() {
    let (_, _, service) = fixture(RecordingNotifier::default());
    let err = service
        .create_budget("u1", march_budget(&[("Food", dec!(60)), ("Rent", dec!(50))]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidInput(_))));
}

#[tokio::test]
async fn test_create_budget_rejects_duplicate_category() {
    let (_, _, service) = fixture(RecordingNotifier::default());
    let err = service
        .create_budget("u1", march_budget(&[("Food", dec!(20)), (" Food ", dec!(20))]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_create_budget_rejects_inverted_dates_and_bad_percentage() {
    let (_, _, service) = fixture(RecordingNotifier::default());
    let mut inverted = march_budget(&[("Food", dec!(20))]);
    inverted.end_date = d(2026, 2, 1);
    assert!(service.create_budget("u1", inverted).await.is_err());

    let zero = march_budget(&[("Food", Decimal::ZERO)]);
    assert!(service.create_budget("u1", zero).await.is_err());
}

#[tokio::test]
async fn test_get_budgets_reports_spend_per_category() {
    let (ledger, _, service) = fixture(RecordingNotifier::default());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(30)), ("Rent", dec!(50))]))
        .await
        .unwrap();
    ledger.push_expense("u1", d(2026, 3, 2), dec!(120), "Food");
    ledger.push_expense("u1", d(2026, 2, 28), dec!(999), "Food");
    ledger.push_expense("u1", d(2026, 3, 3), dec!(400), "Rent");

    let statuses = service.get_budgets("u1").unwrap();
    assert_eq!(statuses.len(), 1);
    let food = &statuses[0].categories[0];
    assert_eq!(food.limit, dec!(300));
    assert_eq!(food.spent, dec!(120));
    assert_eq!(statuses[0].total_spent, dec!(520));
}

#[tokio::test]
async fn test_category_overrun_warns_without_alert() {
    let (ledger, notifier, service) = fixture(RecordingNotifier::default());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(10)), ("Rent", dec!(50))]))
        .await
        .unwrap();
    let expense = ledger.push_expense("u1", d(2026, 3, 5), dec!(150), "Food");

    let warnings = service.evaluate_budget_warnings("u1", &expense).await.unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, BudgetWarningKind::CategoryLimitExceeded);
    assert_eq!(warnings[0].budget_id, "march");
    assert!(notifier.sent.read().unwrap().is_empty());
}

#[tokio::test]
async fn test_alert_only_on_the_crossing_expense() {
    let (ledger, notifier, service) = fixture(RecordingNotifier::default());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(100))]))
        .await
        .unwrap();

    let first = ledger.push_expense("u1", d(2026, 3, 5), dec!(1100), "Food");
    let warnings = service.evaluate_budget_warnings("u1", &first).await.unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.kind == BudgetWarningKind::LimitCrossingNotified));

    let second = ledger.push_expense("u1", d(2026, 3, 6), dec!(50), "Food");
    let warnings = service.evaluate_budget_warnings("u1", &second).await.unwrap();
    let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BudgetWarningKind::CategoryLimitExceeded,
            BudgetWarningKind::TotalLimitExceeded,
        ]
    );
    assert_eq!(notifier.sent.read().unwrap().len(), 1);
    assert_eq!(notifier.sent.read().unwrap()[0].1, "Budget 'March' Exceeded");
}

#[tokio::test]
async fn test_expense_outside_window_does_not_realert() {
    let (ledger, notifier, service) = fixture(RecordingNotifier::default());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(100))]))
        .await
        .unwrap();

    let crossing = ledger.push_expense("u1", d(2026, 3, 5), dec!(1050), "Food");
    service.evaluate_budget_warnings("u1", &crossing).await.unwrap();
    assert_eq!(notifier.sent.read().unwrap().len(), 1);

    // Today is still in March, the expense belongs to April.
    let april = ledger.push_expense("u1", d(2026, 4, 2), dec!(100), "Food");
    let warnings = service.evaluate_budget_warnings("u1", &april).await.unwrap();
    assert!(warnings.is_empty());
    assert_eq!(notifier.sent.read().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_alert_becomes_a_warning() {
    let (ledger, _, service) = fixture(RecordingNotifier::failing());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(100))]))
        .await
        .unwrap();
    let expense = ledger.push_expense("u1", d(2026, 3, 5), dec!(1001), "Food");

    let warnings = service.evaluate_budget_warnings("u1", &expense).await.unwrap();
    let last = warnings.last().unwrap();
    assert_eq!(last.kind, BudgetWarningKind::NotificationFailed);
}

#[tokio::test]
async fn test_inactive_or_unrelated_budgets_are_ignored() {
    let (ledger, notifier, service) = fixture(RecordingNotifier::default());
    let mut february = march_budget(&[("Food", dec!(10))]);
    february.id = Some("feb".to_string());
    february.start_date = d(2026, 2, 1);
    february.end_date = d(2026, 2, 28);
    service.create_budget("u1", february).await.unwrap();
    service
        .create_budget("u1", march_budget(&[("Rent", dec!(10))]))
        .await
        .unwrap();

    let expense = ledger.push_expense("u1", d(2026, 3, 5), dec!(5000), "Food");
    let warnings = service.evaluate_budget_warnings("u1", &expense).await.unwrap();
    assert!(warnings.is_empty());
    assert!(notifier.sent.read().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_budget_of_other_user_is_not_found() {
    let (_, _, service) = fixture(RecordingNotifier::default());
    service
        .create_budget("u1", march_budget(&[("Food", dec!(10))]))
        .await
        .unwrap();

    let err = service.delete_budget("u2", "march").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    service.delete_budget("u1", "march").await.unwrap();
    assert!(service.get_budgets("u1").unwrap().is_empty());
}
