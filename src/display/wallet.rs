//! Wallet display formatting

use crate::models::Wallet;

use super::style::DisplayStyle;

/// Format a list of wallets as a table
pub fn format_wallet_list(wallets: &[Wallet], style: &DisplayStyle) -> String {
    if wallets.is_empty() {
        return "No wallets found.".to_string();
    }

    let name_width = wallets
        .iter()
        .map(|w| w.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:<12}  {:>12}  {}\n",
        "ID",
        "Name",
        "Type",
        "Balance",
        "Savings",
        name_width = name_width,
    ));

    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:-<12}  {:->12}  {:-<7}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for wallet in wallets {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:<12}  {:>12}  {}\n",
            wallet.id.to_string(),
            wallet.name,
            wallet.wallet_type.to_string(),
            style.money(wallet.balance),
            if wallet.is_savings_wallet { "yes" } else { "" },
            name_width = name_width,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletType;

    #[test]
    fn test_empty_list() {
        assert_eq!(format_wallet_list(&[], &DisplayStyle::default()), "No wallets found.");
    }

    #[test]
    fn test_marks_savings_wallets() {
        let wallets = vec![
            Wallet::new("Checking", WalletType::Checking),
            Wallet::new("Rainy Day", WalletType::Savings).savings(true),
        ];
        let output = format_wallet_list(&wallets, &DisplayStyle::default());
        let savings_row = output.lines().find(|l| l.contains("Rainy Day")).unwrap();
        assert!(savings_row.trim_end().ends_with("yes"));
        assert!(!output.lines().find(|l| l.contains("Checking")).unwrap().ends_with("yes"));
    }
}
