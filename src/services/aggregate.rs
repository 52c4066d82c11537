//! Monthly aggregation
//!
//! Reduces a month's transactions into totals, an expense breakdown per
//! category, and cumulative daily series. Aggregation is pure: the result
//! depends only on the inputs, never on their order.

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::models::{CategoryId, Money, MonthKey, Transaction, Wallet};

use super::classify::{ClassificationRules, TxClass};

/// Income, expenses, savings and the resulting balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    pub savings: Money,
    pub balance: Money,
}

impl Totals {
    fn add(&mut self, class: TxClass, amount: Money) {
        match class {
            TxClass::Income => self.income += amount,
            TxClass::Expense => self.expenses += amount,
            TxClass::Savings => self.savings += amount,
            TxClass::Transfer => {}
        }
        self.balance = self.income - self.expenses - self.savings;
    }
}

/// One day of the cumulative series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPoint {
    pub day: u32,
    pub income: Money,
    pub expenses: Money,
    pub savings: Money,
    pub balance: Money,
}

/// Running totals per calendar day; index 0 is the 1st of the month
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailySeries {
    pub income: Vec<Money>,
    pub expenses: Vec<Money>,
    pub savings: Vec<Money>,
    pub balance: Vec<Money>,
}

impl DailySeries {
    /// Number of days covered
    pub fn len(&self) -> usize {
        self.balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_empty()
    }

    /// The running values at the end of a given day (1-based)
    pub fn day(&self, day: u32) -> Option<DailyPoint> {
        let i = (day as usize).checked_sub(1)?;
        Some(DailyPoint {
            day,
            income: *self.income.get(i)?,
            expenses: *self.expenses.get(i)?,
            savings: *self.savings.get(i)?,
            balance: *self.balance.get(i)?,
        })
    }

    /// Iterate over every day of the month
    pub fn points(&self) -> impl Iterator<Item = DailyPoint> + '_ {
        (1..=self.len() as u32).filter_map(move |d| self.day(d))
    }
}

/// Everything derived from one month of transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub income: Money,
    pub expenses: Money,
    pub savings: Money,
    /// income - expenses - savings; the month's flow, not net worth
    pub balance: Money,
    /// Plain transfers between wallets, excluded from the balance
    pub transfers: Money,
    /// The same totals over planned amounts
    pub planned: Totals,
    /// Expense spend per category
    pub by_category: BTreeMap<CategoryId, Money>,
    pub by_day: DailySeries,
}

impl MonthSummary {
    pub fn totals(&self) -> Totals {
        Totals {
            income: self.income,
            expenses: self.expenses,
            savings: self.savings,
            balance: self.balance,
        }
    }

    /// Expense spend for a category (zero when it has none)
    pub fn spent_in(&self, category: &CategoryId) -> Money {
        self.by_category.get(category).copied().unwrap_or_default()
    }
}

/// Builds month summaries under a fixed classification policy
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    rules: ClassificationRules<'a>,
}

impl<'a> Aggregator<'a> {
    pub fn new(rules: ClassificationRules<'a>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> ClassificationRules<'a> {
        self.rules
    }

    /// Aggregate a month's transactions
    ///
    /// Transactions dated outside `month` still count toward the totals but
    /// are left out of the daily series.
    pub fn aggregate(
        &self,
        month: MonthKey,
        transactions: &[Transaction],
        wallets: &[Wallet],
    ) -> MonthSummary {
        let days = month.days_in_month() as usize;
        let mut actual = Totals::default();
        let mut planned = Totals::default();
        let mut transfers = Money::zero();
        let mut by_category: BTreeMap<CategoryId, Money> = BTreeMap::new();
        let mut day_income = vec![Money::zero(); days];
        let mut day_expenses = vec![Money::zero(); days];
        let mut day_savings = vec![Money::zero(); days];

        for txn in transactions {
            let class = self.rules.classify(txn, wallets);
            let amount = txn.actual_amount;

            actual.add(class, amount);
            planned.add(class, txn.planned_amount);

            match class {
                TxClass::Transfer => transfers += amount,
                TxClass::Expense => {
                    *by_category.entry(txn.category.clone()).or_default() += amount;
                }
                TxClass::Income | TxClass::Savings => {}
            }

            if !month.contains(txn.date) {
                tracing::debug!(
                    transaction = %txn.id,
                    date = %txn.date,
                    month = %month,
                    "transaction outside month left out of daily series"
                );
                continue;
            }

            let i = txn.date.day0() as usize;
            match class {
                TxClass::Income => day_income[i] += amount,
                TxClass::Expense => day_expenses[i] += amount,
                TxClass::Savings => day_savings[i] += amount,
                TxClass::Transfer => {}
            }
        }

        MonthSummary {
            month,
            income: actual.income,
            expenses: actual.expenses,
            savings: actual.savings,
            balance: actual.balance,
            transfers,
            planned,
            by_category,
            by_day: cumulative_series(&day_income, &day_expenses, &day_savings),
        }
    }
}

/// Turn per-day amounts into running sums; the balance starts at zero
fn cumulative_series(income: &[Money], expenses: &[Money], savings: &[Money]) -> DailySeries {
    let mut series = DailySeries::default();
    let (mut inc, mut exp, mut sav, mut bal) =
        (Money::zero(), Money::zero(), Money::zero(), Money::zero());

    for i in 0..income.len() {
        inc += income[i];
        exp += expenses[i];
        sav += savings[i];
        bal = bal + income[i] - expenses[i] - savings[i];

        series.income.push(inc);
        series.expenses.push(exp);
        series.savings.push(sav);
        series.balance.push(bal);
    }

    series
}
