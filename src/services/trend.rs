//! Rollover and trend engine
//!
//! Compares a month's totals with the previous month and exposes the
//! carried-in balance. The rollover figures themselves are set outside this
//! engine and only read here.

use crate::models::{BudgetMonth, Money, MonthKey, Wallet};

use super::aggregate::{Aggregator, MonthSummary, Totals};

/// Round half up, the way percentage figures have always been displayed
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Percentage change of `current` against `previous`
///
/// Divides by `|previous|` so a negative baseline does not flip the sign.
/// A zero baseline yields 100 for a positive current value and 0 otherwise.
pub fn trend_percent(current: Money, previous: Money) -> i64 {
    if previous.is_zero() {
        return if current.is_positive() { 100 } else { 0 };
    }
    let delta = (current - previous).as_f64();
    round_half_up(100.0 * delta / previous.abs().as_f64())
}

/// Trend percentages for each headline metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trends {
    pub income: i64,
    pub expenses: i64,
    pub savings: i64,
    pub balance: i64,
}

impl Trends {
    pub fn between(current: &Totals, previous: &Totals) -> Self {
        Self {
            income: trend_percent(current.income, previous.income),
            expenses: trend_percent(current.expenses, previous.expenses),
            savings: trend_percent(current.savings, previous.savings),
            balance: trend_percent(current.balance, previous.balance),
        }
    }
}

/// A month compared with the one before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthComparison {
    pub month: MonthKey,
    pub previous_month: MonthKey,
    pub summary: MonthSummary,
    /// Zero totals when the previous month was never created
    pub previous: Totals,
    pub has_previous: bool,
    pub trends: Trends,
    /// Opaque carried-in actual balance
    pub start_balance: Money,
    /// Opaque carried-in planned balance
    pub planned_start_balance: Money,
}

/// Builds month-over-month comparisons
#[derive(Debug, Clone, Copy)]
pub struct TrendEngine<'a> {
    aggregator: Aggregator<'a>,
}

impl<'a> TrendEngine<'a> {
    pub fn new(aggregator: Aggregator<'a>) -> Self {
        Self { aggregator }
    }

    /// Compare `current` with `previous`, which must be the preceding month
    /// of the same user when given
    pub fn compare(
        &self,
        current: &BudgetMonth,
        previous: Option<&BudgetMonth>,
        wallets: &[Wallet],
    ) -> MonthComparison {
        let month = current.key();
        let previous_month = month.prev();
        let summary = self
            .aggregator
            .aggregate(month, &current.transactions, wallets);

        let previous = previous
            .filter(|p| p.key() == previous_month && p.user_id == current.user_id)
            .map(|p| {
                self.aggregator
                    .aggregate(previous_month, &p.transactions, wallets)
                    .totals()
            });

        let has_previous = previous.is_some();
        let previous = previous.unwrap_or_default();
        let trends = Trends::between(&summary.totals(), &previous);

        MonthComparison {
            month,
            previous_month,
            summary,
            previous,
            has_previous,
            trends,
            start_balance: current.start_balance(),
            planned_start_balance: current.planned_start_balance(),
        }
    }
}

/// Pick the month preceding `current` for the same user out of a list
pub fn resolve_previous<'m>(
    months: &'m [BudgetMonth],
    current: &BudgetMonth,
) -> Option<&'m BudgetMonth> {
    let wanted = current.month_ref().prev();
    months.iter().find(|m| m.month_ref() == wanted)
}
