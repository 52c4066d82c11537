//! Budget limit card formatting

use crate::services::{LimitCard, OverallProgress};

use super::report::{format_bar, separator, truncate};
use super::style::DisplayStyle;

/// Format limit cards with the overall progress line
pub fn format_limit_cards(
    cards: &[LimitCard],
    overall: &OverallProgress,
    style: &DisplayStyle,
) -> String {
    if cards.is_empty() {
        return "No spending or limits this month.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<20} {:>12} {:>12} {:>6}  {}\n",
        "Category", "Spent", "Limit", "%", "Progress"
    ));
    output.push_str(&separator(68));
    output.push('\n');

    for card in cards {
        let (limit, percent, flag) = if card.status.is_unlimited {
            ("unlimited".to_string(), "-".to_string(), "")
        } else {
            let flag = if card.status.is_over_budget {
                " OVER"
            } else if card.status.is_at_limit {
                " AT LIMIT"
            } else {
                ""
            };
            (
                style.money(card.limit),
                format!("{}%", card.status.percent),
                flag,
            )
        };

        output.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>6}  {}{}\n",
            truncate(&card.category.label, 20),
            style.money(card.spent),
            limit,
            percent,
            format_bar(if card.status.is_unlimited { 0 } else { card.status.percent }, 10),
            flag
        ));
    }

    output.push_str(&separator(68));
    output.push('\n');
    if overall.limit.is_zero() {
        output.push_str("Overall: no limits set\n");
    } else {
        output.push_str(&format!(
            "Overall: {} of {} ({}%)\n",
            style.money(overall.spent),
            style.money(overall.limit),
            overall.percent
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetMonth, Money, MonthKey, Taxonomy, Transaction, UserId, WalletId};
    use crate::services::{Aggregator, ClassificationRules, LimitTracker};
    use chrono::NaiveDate;

    #[test]
    fn test_cards_show_status() {
        let taxonomy = Taxonomy::new();
        let key = MonthKey::new(2025, 2).unwrap();
        let mut month = BudgetMonth::new(UserId::new(), key);
        let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        month.push(Transaction::new("Dinner", "Food", Money::from_cents(15_000), date, WalletId::new()));
        month.push(Transaction::new("Movies", "Entertainment", Money::from_cents(2_000), date, WalletId::new()));
        month.set_limit("Food".into(), Money::from_cents(10_000)).unwrap();

        let summary = Aggregator::new(ClassificationRules::new(&taxonomy)).aggregate(
            key,
            &month.transactions,
            &[],
        );
        let tracker = LimitTracker::new(&taxonomy);
        let cards = tracker.cards(&month, &summary);
        let output = format_limit_cards(&cards, &tracker.overall(&cards), &DisplayStyle::default());

        assert!(output.contains("Food"));
        assert!(output.contains("150%"));
        assert!(output.contains("OVER"));
        assert!(output.contains("unlimited"));
        assert!(output.contains("Overall: $150.00 of $100.00 (150%)"));
    }

    #[test]
    fn test_empty_cards() {
        let overall = OverallProgress {
            spent: Money::zero(),
            limit: Money::zero(),
            percent: 0,
        };
        assert!(format_limit_cards(&[], &overall, &DisplayStyle::default()).contains("No spending"));
    }
}
