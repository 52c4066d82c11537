//! User formatting preferences for amounts and dates

use std::fmt::Write;

use chrono::NaiveDate;

use crate::config::Settings;
use crate::models::Money;

const ISO_DATE: &str = "%Y-%m-%d";

/// Currency symbol and date format applied by every formatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStyle {
    pub currency_symbol: String,
    pub date_format: String,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            date_format: ISO_DATE.to_string(),
        }
    }
}

impl DisplayStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .with_currency_symbol(&settings.currency_symbol)
            .with_date_format(&settings.date_format)
    }

    pub fn with_currency_symbol(mut self, symbol: &str) -> Self {
        self.currency_symbol = symbol.to_string();
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    pub fn money(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.currency_symbol)
    }

    /// Format a date; an unusable format string falls back to ISO
    pub fn date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            return date.format(ISO_DATE).to_string();
        }
        out
    }
}
