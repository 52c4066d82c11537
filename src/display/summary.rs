//! Month summary and daily series formatting

use chrono::Duration;

use crate::models::{Money, MonthKey};
use crate::services::{DailySeries, MonthComparison};

use super::report::{format_trend, separator};
use super::style::DisplayStyle;

/// Format the month overview: actual and planned totals with trends
pub fn format_month_summary(comparison: &MonthComparison, style: &DisplayStyle) -> String {
    let summary = &comparison.summary;
    let mut output = String::new();

    output.push_str(&format!("Budget for {}\n", comparison.month));
    output.push_str(&separator(56));
    output.push('\n');
    output.push_str(&format!(
        "{:<10} {:>14} {:>14} {:>14}\n",
        "", "Actual", "Planned", "vs last month"
    ));

    let rows: [(&str, Money, Money, i64); 4] = [
        ("Income", summary.income, summary.planned.income, comparison.trends.income),
        ("Expenses", summary.expenses, summary.planned.expenses, comparison.trends.expenses),
        ("Savings", summary.savings, summary.planned.savings, comparison.trends.savings),
        ("Balance", summary.balance, summary.planned.balance, comparison.trends.balance),
    ];

    for (label, actual, planned, trend) in rows {
        let trend = if comparison.has_previous {
            format_trend(trend)
        } else {
            "-".to_string()
        };
        output.push_str(&format!(
            "{:<10} {:>14} {:>14} {:>14}\n",
            label,
            style.money(actual),
            style.money(planned),
            trend
        ));
    }

    output.push_str(&separator(56));
    output.push('\n');

    if !summary.transfers.is_zero() {
        output.push_str(&format!("Transfers:      {}\n", style.money(summary.transfers)));
    }
    output.push_str(&format!(
        "Start balance:  {}\n",
        style.money(comparison.start_balance)
    ));
    output.push_str(&format!(
        "Planned start:  {}\n",
        style.money(comparison.planned_start_balance)
    ));

    if !comparison.has_previous {
        output.push_str(&format!(
            "No data for {}; trends are against zero.\n",
            comparison.previous_month
        ));
    }

    output
}

/// Format the per-day series as a table, skipping empty days unless `all_days`
pub fn format_daily_series(
    month: MonthKey,
    series: &DailySeries,
    all_days: bool,
    style: &DisplayStyle,
) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<10} {:>12} {:>12} {:>12} {:>12}\n",
        "Date", "Income", "Expenses", "Savings", "Balance"
    ));
    output.push_str(&separator(62));
    output.push('\n');

    let mut shown = 0;
    for point in series.points() {
        let quiet = point.income.is_zero() && point.expenses.is_zero() && point.savings.is_zero();
        if quiet && !all_days {
            continue;
        }
        shown += 1;
        let date = month.start_date() + Duration::days(i64::from(point.day) - 1);
        output.push_str(&format!(
            "{:<10} {:>12} {:>12} {:>12} {:>12}\n",
            style.date(date),
            style.money(point.income),
            style.money(point.expenses),
            style.money(point.savings),
            style.money(point.balance)
        ));
    }

    if shown == 0 {
        output.push_str("No activity this month.\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetMonth, Taxonomy, Transaction, UserId, WalletId};
    use crate::services::{Aggregator, ClassificationRules, TrendEngine};
    use chrono::NaiveDate;

    fn scenario_a() -> BudgetMonth {
        let key = MonthKey::new(2025, 1).unwrap();
        let mut month = BudgetMonth::new(UserId::new(), key);
        let wallet = WalletId::new();
        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        month.push(Transaction::new("Salary", "Paycheck", Money::from_cents(100_000), day(1), wallet));
        month.push(Transaction::new("Groceries", "Food", Money::from_cents(20_000), day(3), wallet));
        month.push(Transaction::new("Stash", "Savings", Money::from_cents(10_000), day(3), wallet));
        month
    }

    #[test]
    fn test_summary_lists_totals() {
        let taxonomy = Taxonomy::new();
        let engine = TrendEngine::new(Aggregator::new(ClassificationRules::new(&taxonomy)));
        let comparison = engine.compare(&scenario_a(), None, &[]);

        let output = format_month_summary(&comparison, &DisplayStyle::default());
        assert!(output.contains("Budget for 2025-01"));
        assert!(output.contains("$1000.00"));
        assert!(output.contains("$700.00"));
        assert!(output.contains("No data for 2024-12"));
    }

    #[test]
    fn test_daily_skips_quiet_days() {
        let taxonomy = Taxonomy::new();
        let aggregator = Aggregator::new(ClassificationRules::new(&taxonomy));
        let month = scenario_a();
        let summary = aggregator.aggregate(month.key(), &month.transactions, &[]);

        let style = DisplayStyle::default();
        let output = format_daily_series(month.key(), &summary.by_day, false, &style);
        assert!(output.contains("2025-01-01"));
        assert!(output.contains("2025-01-03"));
        assert!(!output.contains("2025-01-02"));

        let full = format_daily_series(month.key(), &summary.by_day, true, &style);
        assert!(full.contains("2025-01-31"));
    }
}
