/// Decimal places kept for every stored amount
pub const DECIMAL_PRECISION: u32 = 2;

/// Upper bound on fixed-point passes in a single materialization run.
/// Every productive pass advances a due date or flips a status, so real runs
/// finish long before this.
pub const MAX_MATERIALIZATION_PASSES: usize = 10_000;

/// Minimum age of an investment's expected return before it is refreshed
pub const RATE_REFRESH_INTERVAL_SECONDS: i64 = 3600;

/// Suggested goal deadlines further out than this are not shown as dates
pub const MAX_DISPLAY_YEARS: u32 = 30;

/// Fallback category for expenses the classifier cannot place
pub const DEFAULT_EXPENSE_CATEGORY: &str = "Miscellaneous";

/// Fallback category for incomes the classifier cannot place
pub const DEFAULT_INCOME_CATEGORY: &str = "Other Income";

/// Category used for the expense mirroring an investment's principal
pub const INVESTMENT_EXPENSE_CATEGORY: &str = "Financial";
