//! Maturity value estimates for investments.

use rust_decimal::{Decimal, MathematicalOps};

use crate::recurring::Frequency;
use crate::utils::decimal_utils::round_money;

use super::investments_model::Investment;

const DAYS_PER_YEAR: i64 = 365;

/// Compounding frequency used when an investment does not set one.
pub fn default_frequency(investment_type: &str) -> Frequency {
    match investment_type.trim().to_lowercase().as_str() {
        "fd" | "fixed deposit" => Frequency::Quarterly,
        "bond" => Frequency::Biannual,
        "rd" | "recurring deposit" => Frequency::Monthly,
        _ => Frequency::Yearly,
    }
}

/// Income category for the maturity payout of an investment type.
pub fn maturity_income_category(investment_type: &str) -> &'static str {
    match investment_type.trim().to_lowercase().as_str() {
        "fd" | "fixed deposit" | "rd" | "recurring deposit" | "bond" => "Interest Income",
        "stock" | "mutual fund" | "etf" | "crypto" | "share" => "Dividends",
        "real estate" | "pension" => "Rental Income",
        _ => "Other Income",
    }
}

fn is_recurring_deposit(investment_type: &str) -> bool {
    let t = investment_type.to_lowercase();
    t.contains("rd") || t.contains("recurring")
}

/// Estimated value at `end_date`, rounded to cents.
///
/// Lump sums compound `periods_per_year × years` times. Recurring deposits
/// treat `amount` as the monthly instalment and use the annuity formula over
/// whole months. Falls back to the principal when dates are missing, the span
/// is not positive, the rate is zero, or the arithmetic overflows.
pub fn estimated_value(investment: &Investment) -> Decimal {
    let principal = round_money(investment.amount);
    let rate = investment.expected_return.unwrap_or(Decimal::ZERO);
    let (Some(start), Some(end)) = (investment.start_date, investment.end_date) else {
        return principal;
    };
    let days = (end - start).num_days();
    if days <= 0 || rate.is_zero() {
        return principal;
    }

    let years = Decimal::from(days) / Decimal::from(DAYS_PER_YEAR);
    let annual_rate = rate / Decimal::ONE_HUNDRED;

    if is_recurring_deposit(&investment.investment_type) {
        let months = (years * Decimal::from(12)).round();
        let Ok(months) = i64::try_from(months) else {
            return principal;
        };
        if months <= 0 {
            return principal;
        }
        let monthly_rate = annual_rate / Decimal::from(12);
        return (Decimal::ONE + monthly_rate)
            .checked_powi(months)
            .and_then(|growth| (growth - Decimal::ONE).checked_div(monthly_rate))
            .and_then(|factor| investment.amount.checked_mul(factor))
            .map(round_money)
            .unwrap_or(principal);
    }

    let frequency = investment
        .frequency
        .unwrap_or_else(|| default_frequency(&investment.investment_type));
    let per_year = Decimal::from(frequency.periods_per_year());
    let periods = per_year * years;
    (Decimal::ONE + annual_rate / per_year)
        .checked_powd(periods)
        .and_then(|growth| investment.amount.checked_mul(growth))
        .map(round_money)
        .unwrap_or(principal)
}
