//! Budget limit tracker
//!
//! Computes spend-vs-limit state per category. A zero limit means the
//! category is unlimited; a missing entry means the same for display, but the
//! two are kept apart in storage so that removing a category is not the same
//! as setting its limit to zero.

use std::collections::BTreeSet;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{BudgetMonth, Category, CategoryId, Money, Taxonomy};

use super::aggregate::MonthSummary;
use super::trend::round_half_up;

/// Spend-vs-limit state for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitStatus {
    pub percent: i64,
    pub is_unlimited: bool,
    pub is_over_budget: bool,
    pub is_at_limit: bool,
}

impl LimitStatus {
    /// Compute the status of `spent` against `limit`
    pub fn compute(limit: Money, spent: Money) -> Self {
        let is_unlimited = limit.is_zero();
        let percent = if limit.is_positive() {
            round_half_up(100.0 * spent.as_f64() / limit.as_f64())
        } else if spent.is_positive() {
            100
        } else {
            0
        };
        let is_over_budget = !is_unlimited && spent > limit;
        let is_at_limit = !is_unlimited && percent == 100 && !is_over_budget;

        Self {
            percent,
            is_unlimited,
            is_over_budget,
            is_at_limit,
        }
    }
}

/// A category's limit card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitCard {
    pub category: Category,
    /// Zero when there is no entry or the entry is unlimited
    pub limit: Money,
    pub has_entry: bool,
    pub spent: Money,
    pub status: LimitStatus,
}

/// Progress over every category with a positive limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallProgress {
    pub spent: Money,
    pub limit: Money,
    pub percent: i64,
}

/// Computes limit cards for a month under the current taxonomy
#[derive(Debug, Clone, Copy)]
pub struct LimitTracker<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> LimitTracker<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Categories that get a card: those with a limit entry or expense spend
    /// this month, restricted to the currently valid taxonomy
    ///
    /// References to categories that no longer exist are dropped.
    pub fn visible_categories(&self, month: &BudgetMonth, summary: &MonthSummary) -> Vec<Category> {
        let candidates: BTreeSet<&CategoryId> = month
            .category_limits
            .keys()
            .chain(summary.by_category.keys())
            .collect();

        candidates
            .into_iter()
            .filter_map(|id| match self.taxonomy.get(id) {
                Some(category) => Some(category),
                None => {
                    tracing::debug!(category = %id, month = %month.key(), "hiding stale category reference");
                    None
                }
            })
            .collect()
    }

    /// One card per visible category
    pub fn cards(&self, month: &BudgetMonth, summary: &MonthSummary) -> Vec<LimitCard> {
        self.visible_categories(month, summary)
            .into_iter()
            .map(|category| {
                let entry = month.limit(&category.id);
                let limit = entry.unwrap_or_default();
                let spent = summary.spent_in(&category.id);
                LimitCard {
                    status: LimitStatus::compute(limit, spent),
                    has_entry: entry.is_some(),
                    category,
                    limit,
                    spent,
                }
            })
            .collect()
    }

    /// Aggregate progress; unlimited categories count toward neither side
    pub fn overall(&self, cards: &[LimitCard]) -> OverallProgress {
        let (spent, limit) = cards
            .iter()
            .filter(|c| c.limit.is_positive())
            .fold((Money::zero(), Money::zero()), |(s, l), c| (s + c.spent, l + c.limit));

        OverallProgress {
            spent,
            limit,
            percent: LimitStatus::compute(limit, spent).percent,
        }
    }

    /// Set a category's limit for the month, returning the previous entry
    pub fn set_limit(
        &self,
        month: &mut BudgetMonth,
        category: &CategoryId,
        limit: Money,
    ) -> LedgerResult<Option<Money>> {
        let category = self
            .taxonomy
            .get(category)
            .ok_or_else(|| LedgerError::category_not_found(category.to_string()))?;
        month
            .set_limit(category.id, limit)
            .map_err(|e| LedgerError::Validation(e.to_string()))
    }
}

/// Drop a removed category's limit entry from every month
///
/// Returns how many months had an entry.
pub fn forget_category<'m>(
    months: impl IntoIterator<Item = &'m mut BudgetMonth>,
    category: &CategoryId,
) -> usize {
    months
        .into_iter()
        .filter_map(|m| m.clear_limit(category))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthKey, SemanticType, Transaction, UserId, WalletId};
    use crate::services::aggregate::Aggregator;
    use crate::services::classify::ClassificationRules;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn test_status_unlimited() {
        for spent in [0, 1, 5000] {
            let status = LimitStatus::compute(m(0), m(spent));
            assert!(status.is_unlimited);
            assert!(!status.is_over_budget);
            assert!(!status.is_at_limit);
        }
        assert_eq!(LimitStatus::compute(m(0), m(10)).percent, 100);
        assert_eq!(LimitStatus::compute(m(0), m(0)).percent, 0);
    }

    #[test]
    fn test_status_bounds() {
        let under = LimitStatus::compute(m(1000), m(250));
        assert_eq!(under.percent, 25);
        assert!(!under.is_over_budget && !under.is_at_limit);

        let at = LimitStatus::compute(m(1000), m(1000));
        assert_eq!(at.percent, 100);
        assert!(at.is_at_limit && !at.is_over_budget);

        // rounds to 100 but still over
        let barely_over = LimitStatus::compute(m(1000), m(1001));
        assert_eq!(barely_over.percent, 100);
        assert!(barely_over.is_over_budget);
        assert!(!barely_over.is_at_limit);

        // rounds to 100 while under
        let nearly = LimitStatus::compute(m(1000), m(996));
        assert_eq!(nearly.percent, 100);
        assert!(nearly.is_at_limit);

        let over = LimitStatus::compute(m(1000), m(1500));
        assert_eq!(over.percent, 150);
        assert!(over.is_over_budget);
    }

    fn setup() -> (Taxonomy, BudgetMonth) {
        let taxonomy = Taxonomy::with_custom(vec![Category::new("Pets", SemanticType::Expense)]);
        let key = MonthKey::new(2025, 1).unwrap();
        let mut month = BudgetMonth::new(UserId::new(), key);
        for (category, cents) in [("Food", 400), ("Pets", 100), ("Pets", 150), ("Pets", 50), ("Paycheck", 5000)] {
            month.push(Transaction::new(category, category, m(cents), key.start_date(), WalletId::new()));
        }
        (taxonomy, month)
    }

    #[test]
    fn test_cards_and_overall() {
        let (taxonomy, mut month) = setup();
        let tracker = LimitTracker::new(&taxonomy);
        tracker.set_limit(&mut month, &"food".into(), m(800)).unwrap();
        tracker.set_limit(&mut month, &"Pets".into(), m(0)).unwrap();
        tracker.set_limit(&mut month, &"Travel".into(), m(200)).unwrap();

        let summary = Aggregator::new(ClassificationRules::new(&taxonomy))
            .aggregate(month.key(), &month.transactions, &[]);
        let cards = tracker.cards(&month, &summary);
        let names: Vec<&str> = cards.iter().map(|c| c.category.label.as_str()).collect();
        assert_eq!(names, vec!["Food", "Pets", "Travel"]);

        let food = &cards[0];
        assert_eq!(food.spent, m(400));
        assert_eq!(food.status.percent, 50);

        let pets = &cards[1];
        assert!(pets.status.is_unlimited);
        assert!(pets.has_entry);

        let overall = tracker.overall(&cards);
        assert_eq!(overall.limit, m(1000));
        assert_eq!(overall.spent, m(400));
        assert_eq!(overall.percent, 40);
    }

    #[test]
    fn test_removed_category_hidden_but_still_counted() {
        let (mut taxonomy, mut month) = setup();
        LimitTracker::new(&taxonomy)
            .set_limit(&mut month, &"Pets".into(), m(500))
            .unwrap();

        taxonomy.remove_custom(&"Pets".into()).unwrap();
        assert_eq!(forget_category(std::iter::once(&mut month), &"Pets".into()), 1);
        assert_eq!(month.limit(&"Pets".into()), None);

        let summary = Aggregator::new(ClassificationRules::new(&taxonomy))
            .aggregate(month.key(), &month.transactions, &[]);
        let cards = LimitTracker::new(&taxonomy).cards(&month, &summary);
        assert!(cards.iter().all(|c| !c.category.id.matches("Pets")));
        assert_eq!(summary.expenses, m(700));
    }

    #[test]
    fn test_stale_limit_entry_is_hidden() {
        let (taxonomy, mut month) = setup();
        month.category_limits.insert("Deleted Thing".into(), m(100));

        let summary = Aggregator::new(ClassificationRules::new(&taxonomy))
            .aggregate(month.key(), &month.transactions, &[]);
        let cards = LimitTracker::new(&taxonomy).cards(&month, &summary);
        assert!(cards.iter().all(|c| !c.category.id.matches("Deleted Thing")));
    }

    #[test]
    fn test_set_limit_rejects_unknown_and_negative() {
        let (taxonomy, mut month) = setup();
        let tracker = LimitTracker::new(&taxonomy);
        assert!(tracker
            .set_limit(&mut month, &"Nope".into(), m(10))
            .unwrap_err()
            .is_not_found());
        assert!(tracker
            .set_limit(&mut month, &"Food".into(), m(-10))
            .unwrap_err()
            .is_validation());
    }
}
