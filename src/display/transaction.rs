//! Transaction display formatting
//!
//! Register rows show the class each transaction lands in, so users can see
//! why a transfer counted as savings.

use crate::models::{find_wallet, Transaction, Wallet};
use crate::services::{ClassificationRules, TxClass};

use super::report::truncate;
use super::style::DisplayStyle;

/// Format a single transaction for display (register row)
pub fn format_transaction_row(txn: &Transaction, class: TxClass, style: &DisplayStyle) -> String {
    let marker = if txn.provisional { "*" } else { " " };

    format!(
        "{}{:<12} {:<10} {:<20} {:<14} {:<8} {:>12}",
        marker,
        txn.id.to_string(),
        style.date(txn.date),
        truncate(&txn.name, 20),
        truncate(txn.category.as_str(), 14),
        class.to_string(),
        style.money(txn.actual_amount)
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register(
    transactions: &[Transaction],
    rules: &ClassificationRules<'_>,
    wallets: &[Wallet],
    style: &DisplayStyle,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        " {:<12} {:<10} {:<20} {:<14} {:<8} {:>12}\n",
        "ID", "Date", "Name", "Category", "Class", "Amount"
    ));
    output.push_str(&"-".repeat(83));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, rules.classify(txn, wallets), style));
        output.push('\n');
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(
    txn: &Transaction,
    wallets: &[Wallet],
    style: &DisplayStyle,
) -> String {
    let wallet_name = |id| {
        find_wallet(wallets, id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut output = String::new();
    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Name:        {}\n", txn.name));
    output.push_str(&format!("Date:        {}\n", style.date(txn.date)));
    output.push_str(&format!("Amount:      {}\n", style.money(txn.actual_amount)));
    if !txn.planned_amount.is_zero() {
        output.push_str(&format!("Planned:     {}\n", style.money(txn.planned_amount)));
    }
    output.push_str(&format!("Category:    {}\n", txn.category));
    if let Some(kind) = txn.kind {
        output.push_str(&format!("Type:        {}\n", kind));
    }
    output.push_str(&format!("Wallet:      {}\n", wallet_name(txn.source_wallet_id)));
    if let Some(dest) = txn.destination_wallet_id {
        output.push_str(&format!("To wallet:   {}\n", wallet_name(dest)));
    }

    output
}
